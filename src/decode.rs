//! Stateless fetch decoding: raw 32-bit words to [`Instruction`] records.
//!
//! Grounded on `riscvemu/src/instr_type.rs`, the one copy in the teacher
//! repo that assembles the B-type and J-type immediates with bitwise OR
//! (the nested `riscvemu/src/instr/rv32i.rs` sibling and the root
//! `src/instr_type.rs` variant both agree on this shape; the discarded
//! `src/fields.rs` used unsafe transmutes for the same job, which this
//! module avoids by going through `utils::sign_extend`).

use thiserror::Error;

use crate::utils::{extract_field, sign_extend};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderError {
    #[error("instruction word 0x{0:08x} is not a valid 32-bit RV32I encoding (bits [1:0] != 0b11)")]
    IllegalInstException(u32),
}

/// A decoded instruction: every field the execution units might need,
/// computed once at fetch time. Pure data; holds no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub address: u64,
    pub raw: u32,
    pub opcode: u32,
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub funct3: u32,
    pub funct7: u32,
    pub imm_i: i32,
    pub imm_s: i32,
    pub imm_b: i32,
    pub imm_u: i32,
    pub imm_j: i32,
}

impl Instruction {
    fn decode(address: u64, raw: u32) -> Self {
        let opcode = extract_field(raw, 6, 0);
        let rd = extract_field(raw, 11, 7);
        let funct3 = extract_field(raw, 14, 12);
        let rs1 = extract_field(raw, 19, 15);
        let rs2 = extract_field(raw, 24, 20);
        let funct7 = extract_field(raw, 31, 25);

        let imm_i = sign_extend(extract_field(raw, 31u32, 20u32), 11) as i32;

        let imm_s_bits = (extract_field(raw, 31, 25) << 5) | extract_field(raw, 11, 7);
        let imm_s = sign_extend(imm_s_bits, 11) as i32;

        let imm_b_bits = (extract_field(raw, 31, 31) << 12)
            | (extract_field(raw, 7, 7) << 11)
            | (extract_field(raw, 30, 25) << 5)
            | (extract_field(raw, 11, 8) << 1);
        let imm_b = sign_extend(imm_b_bits, 12) as i32;

        let imm_u = (extract_field(raw, 31, 12) << 12) as i32;

        let imm_j_bits = (extract_field(raw, 31, 31) << 20)
            | (extract_field(raw, 19, 12) << 12)
            | (extract_field(raw, 20, 20) << 11)
            | (extract_field(raw, 30, 21) << 1);
        let imm_j = sign_extend(imm_j_bits, 20) as i32;

        Self {
            address,
            raw,
            opcode,
            rd,
            rs1,
            rs2,
            funct3,
            funct7,
            imm_i,
            imm_s,
            imm_b,
            imm_u,
            imm_j,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "0x{:08x}: {:#010x} (op=0x{:02x} rd=x{} rs1=x{} rs2=x{} f3={} f7={})",
            self.address, self.raw, self.opcode, self.rd, self.rs1, self.rs2, self.funct3, self.funct7
        )
    }
}

/// Stateless RV32I decoder. Holds no registers or memory: given the same
/// word twice it returns the same `Instruction` twice.
#[derive(Debug, Default)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, address: u64, raw: u32) -> Result<Instruction, DecoderError> {
        if raw & 0b11 != 0b11 {
            return Err(DecoderError::IllegalInstException(raw));
        }
        Ok(Instruction::decode(address, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_compressed_encodings() {
        let decoder = Decoder::new();
        assert!(matches!(
            decoder.decode(0, 0x0000_0001),
            Err(DecoderError::IllegalInstException(_))
        ));
    }

    #[test]
    fn decodes_itype_fields() {
        // addi x1, x2, -1
        let raw = crate::encode::itype(-1, 2, 0b000, 1, 0b0010011);
        let decoder = Decoder::new();
        let inst = decoder.decode(0, raw).unwrap();
        assert_eq!(inst.opcode, 0b0010011);
        assert_eq!(inst.rd, 1);
        assert_eq!(inst.rs1, 2);
        assert_eq!(inst.funct3, 0b000);
        assert_eq!(inst.imm_i, -1);
    }

    #[test]
    fn decodes_utype_upper_immediate() {
        // lui x5, 0x12345
        let raw = crate::encode::ujtype(0x12345 << 12, 5, 0b0110111);
        let decoder = Decoder::new();
        let inst = decoder.decode(0, raw).unwrap();
        assert_eq!(inst.rd, 5);
        assert_eq!(inst.imm_u, 0x12345 << 12);
    }

    #[test]
    fn btype_immediate_is_or_combined_not_and_combined() {
        // beq x1, x2, -4 (branch back to the instruction before this one)
        let raw = crate::encode::btype(-4, 2, 1, 0b000, 0b1100011);
        let decoder = Decoder::new();
        let inst = decoder.decode(0, raw).unwrap();
        assert_eq!(inst.imm_b, -4);
    }

    #[test]
    fn stype_uses_separate_bit_slices_for_rd_and_funct7() {
        // sw x2, 100(x1)
        let raw = crate::encode::stype(100, 2, 1, 0b010, 0b0100011);
        let decoder = Decoder::new();
        let inst = decoder.decode(0, raw).unwrap();
        assert_eq!(inst.imm_s, 100);
        assert_eq!(inst.rs1, 1);
        assert_eq!(inst.rs2, 2);
    }

    #[test]
    fn jtype_immediate_round_trips_a_negative_offset() {
        // jal x1, -8
        let raw = crate::encode::jtype(-8, 1, 0b1101111);
        let decoder = Decoder::new();
        let inst = decoder.decode(0, raw).unwrap();
        assert_eq!(inst.imm_j, -8);
    }
}
