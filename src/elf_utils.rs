//! ELF loading: copy every allocatable section of an ELF image into a
//! [`crate::memory::Memory`].
//!
//! Grounded on `riscvemu/src/elf_utils.rs`'s `load_elf`, adapted to write
//! into the region-based `Memory` (via `write_byte`, relying on
//! write-allocation to carve out the backing `NormalRegion`s) instead of
//! the teacher's flat `Hart.memory`.

use elf::abi::{SHF_ALLOC, SHT_NOBITS};
use elf::endian::AnyEndian;
use elf::ElfBytes;
use thiserror::Error;

use crate::memory::{Memory, MemoryError};

#[derive(Error, Debug)]
pub enum ElfLoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid ELF file: {source}")]
    Parse {
        path: String,
        source: elf::ParseError,
    },
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Load every `SHF_ALLOC` section of the ELF file at `path` into `memory`
/// at its link-time address, and return the entry point.
pub fn load_elf(memory: &mut Memory, path: &str) -> Result<u64, ElfLoadError> {
    let file_data = std::fs::read(path).map_err(|source| ElfLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    let file = ElfBytes::<AnyEndian>::minimal_parse(&file_data).map_err(|source| {
        ElfLoadError::Parse {
            path: path.to_string(),
            source,
        }
    })?;

    for section in file.section_headers().into_iter().flatten() {
        if section.sh_flags & SHF_ALLOC as u64 == 0 || section.sh_type == SHT_NOBITS {
            continue;
        }
        let (data, compression) = file
            .section_data(&section)
            .map_err(|source| ElfLoadError::Parse {
                path: path.to_string(),
                source,
            })?;
        if compression.is_some() {
            continue;
        }
        for (offset, byte) in data.iter().enumerate() {
            memory.write_byte(section.sh_addr + offset as u64, *byte)?;
        }
    }

    Ok(file.ehdr.e_entry)
}
