use serde::{Deserialize, Serialize};

use crate::decoder::Op;

/// How an instruction interprets its operand nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Operand ignored.
    None,
    /// High bit selects RAM or pin, low three bits address it (see [`Location`]).
    Select,
    /// Operand is taken verbatim.
    Immediate,
    /// Operand encodes a relative jump distance.
    Branch,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub mode: AddrMode,
    /// Operand used when a source line omits it.
    pub default_operand: Option<u8>,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Op::Nop,
        mnemonic: "nop",
        mode: AddrMode::None,
        default_operand: Some(1),
    },
    InstrDesc {
        op: Op::Ld,
        mnemonic: "ld",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Ldc,
        mnemonic: "ldc",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::And,
        mnemonic: "and",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Andc,
        mnemonic: "andc",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Or,
        mnemonic: "or",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Orc,
        mnemonic: "orc",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Xnor,
        mnemonic: "xnor",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Sto,
        mnemonic: "sto",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Stoc,
        mnemonic: "stoc",
        mode: AddrMode::Select,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Ien,
        mnemonic: "ien",
        mode: AddrMode::Immediate,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Oen,
        mnemonic: "oen",
        mode: AddrMode::Immediate,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Jmp,
        mnemonic: "jmp",
        mode: AddrMode::Branch,
        default_operand: None,
    },
    InstrDesc {
        op: Op::Rtn,
        mnemonic: "ret",
        mode: AddrMode::None,
        default_operand: Some(1),
    },
    InstrDesc {
        op: Op::Skz,
        mnemonic: "skz",
        mode: AddrMode::None,
        default_operand: Some(1),
    },
];

/// Looks up a basic mnemonic. Matching is case-insensitive.
pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE
        .iter()
        .find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

pub fn desc(op: Op) -> &'static InstrDesc {
    // TABLE holds exactly one entry per Op variant, in Op::ALL order
    &TABLE[op.opcode() as usize]
}

/// A one-bit cell addressed by a `Select`-mode operand.
///
/// `Pin` means an input pin for loads and logic ops and an output pin for
/// stores; the executor decides which through the [`Bus`](crate::memory::Bus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Ram(u8),
    Pin(u8),
}

impl Location {
    pub fn select(operand: u8) -> Self {
        let addr = operand & 0x7;
        if operand & 0x8 != 0 {
            Location::Ram(addr)
        } else {
            Location::Pin(addr)
        }
    }
}

/// Signed jump distance, in words, of a JMP operand, measured from the
/// word following the jump.
pub fn branch_offset(operand: u8) -> i32 {
    let o = (operand & 0xF) as i32;
    if o >= 8 {
        (o - 7) * 4
    } else {
        -((o + 1) * 4)
    }
}
