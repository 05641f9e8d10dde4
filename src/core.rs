//! Fetch-decode-execute orchestration.
//!
//! Grounded on `riscvemu/src/hart.rs`'s `Hart::step()` (fetch, decode,
//! dispatch, advance) and `src/platform.rs`'s `Platform` holding a list of
//! `Instr<E>` executors rather than one hand-written match; generalized
//! here into an ordered `Vec<Box<dyn ExecUnit>>` so new opcode tables can
//! be registered without touching this file.

use crate::decode::Decoder;
use crate::exec::{EmulatorError, ExecUnit};
use crate::memory::Memory;
use crate::registers::IntRegFile;

pub struct Core {
    pub memory: Memory,
    pub registers: IntRegFile,
    decoder: Decoder,
    units: Vec<Box<dyn ExecUnit>>,
    /// When set, `step` prints the retired instruction and resulting PC,
    /// mirroring the teacher's ad hoc `println!` tracing
    /// (`src/cpu.rs`, `riscvemu/src/hart.rs`).
    pub trace: bool,
    cycle: u64,
}

impl Core {
    pub fn new(memory: Memory, registers: IntRegFile) -> Self {
        Self {
            memory,
            registers,
            decoder: Decoder::new(),
            units: Vec::new(),
            trace: false,
            cycle: 0,
        }
    }

    pub fn register_unit(&mut self, unit: Box<dyn ExecUnit>) {
        self.units.push(unit);
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Fetch, decode and execute the instruction at the current PC,
    /// advancing it per the executing unit's own PC update.
    ///
    /// Exactly one registered unit must accept the instruction: zero
    /// acceptors or more than one both indicate a mis-registered opcode
    /// table and are reported as `EmulatorError`, distinct from an
    /// architectural `IllegalInstException` a unit itself may raise.
    pub fn step(&mut self) -> Result<(), EmulatorError> {
        let pc = self.registers.get_pc();
        let raw = self.memory.read_word(pc)?;
        let inst = self.decoder.decode(pc, raw)?;

        let mut accepted = 0usize;
        let mut result = Ok(());
        for unit in &mut self.units {
            match unit.execute(&inst, &mut self.registers, &mut self.memory) {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(err) => {
                    accepted += 1;
                    result = Err(err);
                }
            }
        }

        match accepted {
            0 => {
                return Err(EmulatorError::NoAcceptor {
                    raw: inst.raw,
                    address: inst.address,
                })
            }
            1 => {}
            _ => {
                return Err(EmulatorError::ExecDuplicatedUnitError {
                    raw: inst.raw,
                    address: inst.address,
                })
            }
        }

        result?;

        if self.trace {
            println!("{inst} -> pc=0x{:x}", self.registers.get_pc());
        }
        self.cycle += 1;
        Ok(())
    }
}
