use serde::{Deserialize, Serialize};

use crate::program::Word;

/// Every operation the control unit knows. Opcodes 0x0 and 0xF both decode to `Nop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Nop,
    Ld,
    Ldc,
    And,
    Andc,
    Or,
    Orc,
    Xnor,
    Sto,
    Stoc,
    Ien,
    Oen,
    Jmp,
    Rtn,
    Skz,
}

impl Op {
    pub const ALL: [Op; 15] = [
        Op::Nop,
        Op::Ld,
        Op::Ldc,
        Op::And,
        Op::Andc,
        Op::Or,
        Op::Orc,
        Op::Xnor,
        Op::Sto,
        Op::Stoc,
        Op::Ien,
        Op::Oen,
        Op::Jmp,
        Op::Rtn,
        Op::Skz,
    ];

    /// Canonical opcode nibble emitted by the assembler.
    pub fn opcode(self) -> u8 {
        match self {
            Op::Nop => 0x0,
            Op::Ld => 0x1,
            Op::Ldc => 0x2,
            Op::And => 0x3,
            Op::Andc => 0x4,
            Op::Or => 0x5,
            Op::Orc => 0x6,
            Op::Xnor => 0x7,
            Op::Sto => 0x8,
            Op::Stoc => 0x9,
            Op::Ien => 0xA,
            Op::Oen => 0xB,
            Op::Jmp => 0xC,
            Op::Rtn => 0xD,
            Op::Skz => 0xE,
        }
    }

    pub fn from_opcode(nibble: u8) -> Op {
        match nibble & 0xF {
            0x1 => Op::Ld,
            0x2 => Op::Ldc,
            0x3 => Op::And,
            0x4 => Op::Andc,
            0x5 => Op::Or,
            0x6 => Op::Orc,
            0x7 => Op::Xnor,
            0x8 => Op::Sto,
            0x9 => Op::Stoc,
            0xA => Op::Ien,
            0xB => Op::Oen,
            0xC => Op::Jmp,
            0xD => Op::Rtn,
            0xE => Op::Skz,
            // 0x0 and the alternate 0xF
            _ => Op::Nop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub operand: u8, // low nibble, 0..=15
    pub raw: Word,
}

pub trait Decoder {
    fn decode(&self, word: Word) -> Decoded;
}
