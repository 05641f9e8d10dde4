//! The base RV32I opcode table as a single [`super::ExecUnit`].
//!
//! Grounded on the per-instruction `execute_*_rv32i` functions in
//! `riscvemu/src/hart.rs` (branch/load/store/reg-imm/reg-reg families,
//! sign handling via `interpret_u32_as_signed`). Diverges from that file
//! in three ways the open questions in SPEC_FULL.md §12 call for: STORE
//! uses `imm_s` (the teacher file already gets this right; the bug lived
//! in the decoder, not here), writes to `x0` are discarded in this unit
//! rather than inside the register file, and the PC is left unchanged
//! when an ECALL/EBREAK trap escapes instead of advancing past it.

use crate::decode::Instruction;
use crate::encode::{
    OP, OP_AUIPC, OP_BRANCH, OP_IMM, OP_JAL, OP_JALR, OP_LOAD, OP_LUI, OP_MISC_MEM, OP_STORE,
    OP_SYSTEM,
};
use crate::memory::Memory;
use crate::registers::IntRegFile;
use crate::utils::{interpret_i32_as_unsigned, interpret_u32_as_signed, sign_extend};

use super::{ExecError, ExecUnit, Exception, InstError, Trap};

/// Stateless RV32I execution unit; holds no registers or memory itself,
/// those live on the `Core`/`IntRegFile`/`Memory` it is handed each step.
#[derive(Debug, Default)]
pub struct Rv32iUnit;

impl Rv32iUnit {
    pub fn new() -> Self {
        Self
    }
}

/// Write `value` into `rd`, discarding the write if `rd` is `x0`. Per
/// spec.md §4.2 this policy lives in the execution unit, not the
/// register file.
fn write_gpr(regs: &mut IntRegFile, rd: u32, value: u32) -> Result<(), ExecError> {
    if rd != 0 {
        regs.write(rd as usize, value as u64)?;
    }
    Ok(())
}

fn read_gpr(regs: &IntRegFile, index: u32) -> Result<u32, ExecError> {
    Ok(regs.read(index as usize)? as u32)
}

fn check_aligned(addr: u32, size: u32) -> Result<(), ExecError> {
    if addr % size != 0 {
        return Err(ExecError::Inst(InstError::Exception(
            Exception::MemMisalignedException(addr as u64),
        )));
    }
    Ok(())
}

impl ExecUnit for Rv32iUnit {
    fn execute(
        &mut self,
        inst: &Instruction,
        regs: &mut IntRegFile,
        mem: &mut Memory,
    ) -> Result<bool, ExecError> {
        let pc = inst.address as u32;
        let mut next_pc = pc.wrapping_add(4);

        match inst.opcode {
            OP_LUI => {
                write_gpr(regs, inst.rd, inst.imm_u as u32)?;
            }
            OP_AUIPC => {
                write_gpr(regs, inst.rd, pc.wrapping_add(inst.imm_u as u32))?;
            }
            OP_JAL => {
                write_gpr(regs, inst.rd, next_pc)?;
                next_pc = pc.wrapping_add(inst.imm_j as u32);
                check_aligned(next_pc, 4)?;
            }
            OP_JALR => {
                let base = read_gpr(regs, inst.rs1)?;
                let target = base.wrapping_add(inst.imm_i as u32) & !1u32;
                write_gpr(regs, inst.rd, next_pc)?;
                next_pc = target;
                check_aligned(next_pc, 4)?;
            }
            OP_BRANCH => {
                let rs1 = read_gpr(regs, inst.rs1)?;
                let rs2 = read_gpr(regs, inst.rs2)?;
                let taken = match inst.funct3 {
                    0b000 => rs1 == rs2,
                    0b001 => rs1 != rs2,
                    0b100 => interpret_u32_as_signed(rs1) < interpret_u32_as_signed(rs2),
                    0b101 => interpret_u32_as_signed(rs1) >= interpret_u32_as_signed(rs2),
                    0b110 => rs1 < rs2,
                    0b111 => rs1 >= rs2,
                    _ => {
                        return Err(ExecError::Inst(InstError::Exception(
                            Exception::IllegalInstException(inst.raw),
                        )))
                    }
                };
                if taken {
                    next_pc = pc.wrapping_add(inst.imm_b as u32);
                    check_aligned(next_pc, 4)?;
                }
            }
            OP_LOAD => {
                let base = read_gpr(regs, inst.rs1)?;
                let addr = base.wrapping_add(inst.imm_i as u32) as u64;
                let value = match inst.funct3 {
                    0b000 => sign_extend(mem.read_byte(addr)?, 7),
                    0b001 => sign_extend(mem.read_halfword(addr)?, 15),
                    0b010 => mem.read_word(addr)?,
                    0b100 => mem.read_byte(addr)? as u32,
                    0b101 => mem.read_halfword(addr)? as u32,
                    _ => {
                        return Err(ExecError::Inst(InstError::Exception(
                            Exception::IllegalInstException(inst.raw),
                        )))
                    }
                };
                write_gpr(regs, inst.rd, value)?;
            }
            OP_STORE => {
                let base = read_gpr(regs, inst.rs1)?;
                let addr = base.wrapping_add(inst.imm_s as u32) as u64;
                let value = read_gpr(regs, inst.rs2)?;
                match inst.funct3 {
                    0b000 => mem.write_byte(addr, value as u8)?,
                    0b001 => mem.write_halfword(addr, value as u16)?,
                    0b010 => mem.write_word(addr, value)?,
                    _ => {
                        return Err(ExecError::Inst(InstError::Exception(
                            Exception::IllegalInstException(inst.raw),
                        )))
                    }
                }
            }
            OP_IMM => {
                let rs1 = read_gpr(regs, inst.rs1)?;
                let imm = inst.imm_i as u32;
                let value = match inst.funct3 {
                    0b000 => rs1.wrapping_add(imm),
                    0b010 => (interpret_u32_as_signed(rs1) < interpret_u32_as_signed(imm)) as u32,
                    0b011 => (rs1 < imm) as u32,
                    0b100 => rs1 ^ imm,
                    0b110 => rs1 | imm,
                    0b111 => rs1 & imm,
                    // SLLI/SRLI/SRAI share the R-type layout: the upper
                    // bits of what would be the I-immediate are really
                    // funct7, and rs2's position holds the shamt.
                    0b001 => {
                        if inst.funct7 != 0 {
                            return Err(ExecError::Inst(InstError::Exception(
                                Exception::IllegalInstException(inst.raw),
                            )));
                        }
                        rs1 << inst.rs2
                    }
                    0b101 => match inst.funct7 {
                        0b0000000 => rs1 >> inst.rs2,
                        0b0100000 => {
                            interpret_i32_as_unsigned(interpret_u32_as_signed(rs1) >> inst.rs2)
                        }
                        _ => {
                            return Err(ExecError::Inst(InstError::Exception(
                                Exception::IllegalInstException(inst.raw),
                            )))
                        }
                    },
                    _ => unreachable!("funct3 is a 3-bit field"),
                };
                write_gpr(regs, inst.rd, value)?;
            }
            OP => {
                let rs1 = read_gpr(regs, inst.rs1)?;
                let rs2 = read_gpr(regs, inst.rs2)?;
                let shamt = rs2 & 0x1f;
                let value = match (inst.funct7, inst.funct3) {
                    (0b0000000, 0b000) => rs1.wrapping_add(rs2),
                    (0b0100000, 0b000) => rs1.wrapping_sub(rs2),
                    (0b0000000, 0b001) => rs1 << shamt,
                    (0b0000000, 0b010) => {
                        (interpret_u32_as_signed(rs1) < interpret_u32_as_signed(rs2)) as u32
                    }
                    (0b0000000, 0b011) => (rs1 < rs2) as u32,
                    (0b0000000, 0b100) => rs1 ^ rs2,
                    (0b0000000, 0b101) => rs1 >> shamt,
                    (0b0100000, 0b101) => {
                        interpret_i32_as_unsigned(interpret_u32_as_signed(rs1) >> shamt)
                    }
                    (0b0000000, 0b110) => rs1 | rs2,
                    (0b0000000, 0b111) => rs1 & rs2,
                    _ => {
                        return Err(ExecError::Inst(InstError::Exception(
                            Exception::IllegalInstException(inst.raw),
                        )))
                    }
                };
                write_gpr(regs, inst.rd, value)?;
            }
            OP_MISC_MEM => {
                // FENCE: no cross-hart memory ordering to enforce with a
                // single hart and no speculative execution; treated as a
                // no-op that still retires normally.
            }
            OP_SYSTEM => {
                return match (inst.funct3, inst.imm_i) {
                    (0b000, 0) => Err(ExecError::Inst(InstError::Trap(Trap::ECALLTrap(
                        pc as u64,
                    )))),
                    (0b000, 1) => Err(ExecError::Inst(InstError::Trap(Trap::EBREAKTrap(
                        pc as u64,
                    )))),
                    _ => Err(ExecError::Inst(InstError::Exception(
                        Exception::IllegalInstException(inst.raw),
                    ))),
                };
            }
            _ => return Ok(false),
        }

        regs.set_pc(next_pc as u64);
        Ok(true)
    }
}
