//! Execution units: the accept/execute protocol a [`crate::core::Core`]
//! offers each decoded instruction to.
//!
//! Grounded on `riscvemu/src/hart.rs`'s `execute(instr) -> Result<(),
//! ExecutionError>` dispatch and its `RegisterError`/`ExecutionError`/`Trap`
//! error enums, generalized here into an accept/reject protocol
//! (`execute` returns whether the instruction belonged to this unit) so a
//! `Core` can hold a list of units rather than one monolithic match.

pub mod rv32i;

use thiserror::Error;

use crate::decode::{DecoderError, Instruction};
use crate::memory::MemoryError;
use crate::registers::RegisterFileError;

pub use rv32i::Rv32iUnit;

/// An architectural exception: something wrong with the instruction
/// stream or its operands, as opposed to a trap a program raises on
/// purpose.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[error("illegal instruction 0x{0:08x}")]
    IllegalInstException(u32),
    #[error("misaligned memory access at address 0x{0:x}")]
    MemMisalignedException(u64),
}

/// A deliberate program-to-simulator escape: ECALL or EBREAK. Baremetal
/// RV32I has no supervisor mode, so these are the only two traps.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    #[error("ecall at pc 0x{0:x}")]
    ECALLTrap(u64),
    #[error("ebreak at pc 0x{0:x}")]
    EBREAKTrap(u64),
}

/// Either an [`Exception`] or a [`Trap`]: the two ways executing one
/// instruction can end without simply retiring.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstError {
    #[error(transparent)]
    Exception(#[from] Exception),
    #[error(transparent)]
    Trap(#[from] Trap),
}

/// Everything that can go wrong while executing one already-decoded
/// instruction: an architectural condition (`InstError`) or a failure in
/// a collaborator (memory out of bounds, bad register index).
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Inst(#[from] InstError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    RegisterFile(#[from] RegisterFileError),
}

/// The umbrella error `Core::step` returns: everything an `ExecUnit`,
/// the `Decoder`, or the step orchestration itself can fail with.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(transparent)]
    Decoder(#[from] DecoderError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    RegisterFile(#[from] RegisterFileError),
    #[error("no execution unit accepted instruction 0x{raw:08x} at 0x{address:x}")]
    NoAcceptor { raw: u32, address: u64 },
    #[error("more than one execution unit accepted instruction 0x{raw:08x} at 0x{address:x}")]
    ExecDuplicatedUnitError { raw: u32, address: u64 },
}

/// One slice of the execution pipeline, e.g. the base RV32I opcode table.
/// `Core::step` offers the decoded instruction to each registered unit in
/// turn; exactly one must accept it.
pub trait ExecUnit {
    /// Attempt to execute `inst`. Returns `Ok(true)` if this unit owns
    /// `inst`'s opcode and has executed it (including the case where
    /// execution produced a trap or exception), `Ok(false)` if `inst`
    /// does not belong to this unit and the core should offer it
    /// elsewhere.
    fn execute(
        &mut self,
        inst: &Instruction,
        regs: &mut crate::registers::IntRegFile,
        mem: &mut crate::memory::Memory,
    ) -> Result<bool, ExecError>;
}
