#![forbid(unsafe_code)]

//! A baremetal RV32I instruction-set simulator: a synthesized physical
//! address space (`memory`), an endianness-aware register file
//! (`registers`), a stateless fetch decoder (`decode`), and a small set
//! of execution units (`exec`) a `Core` drives one step at a time.

pub mod core;
pub mod decode;
pub mod elf_utils;
pub mod encode;
pub mod exec;
pub mod memory;
pub mod registers;
pub mod utils;

/// A physical address. Kept as a plain `u64` rather than a newtype,
/// matching the teacher's use of bare integer addresses throughout
/// (`riscvemu/src/hart/memory.rs`, `src/memory.rs`).
pub type Address = u64;
