use std::fmt::Write as _;

use crate::decoder::{Decoded, Decoder, Op};
use crate::instructions::{branch_offset, desc, AddrMode, Location};
use crate::program::Program;

/// Renders a word in source syntax, with a comment naming what it touches.
pub fn fmt_decoded(d: &Decoded) -> String {
    let mn = desc(d.op).mnemonic;
    match desc(d.op).mode {
        AddrMode::None if d.raw.opcode() == 0xF => format!("nop {:x} ; alt {}", d.operand, d.raw),
        AddrMode::None | AddrMode::Immediate => format!("{} {:x}", mn, d.operand),
        AddrMode::Select => format!("{} {:x} ; {}", mn, d.operand, target(d.op, d.operand)),
        AddrMode::Branch => format!("{} {:x} ; {:+}", mn, d.operand, branch_offset(d.operand)),
    }
}

fn target(op: Op, operand: u8) -> String {
    match Location::select(operand) {
        Location::Ram(a) => format!("ram {a}"),
        Location::Pin(a) if matches!(op, Op::Sto | Op::Stoc) => format!("out {a}"),
        Location::Pin(a) => format!("in {a}"),
    }
}

/// One line per word: index, raw hex, disassembly.
pub fn listing<D: Decoder>(program: &Program, dec: &D) -> String {
    let mut buf = String::new();
    for (i, w) in program.words.iter().enumerate() {
        let _ = writeln!(buf, "{i:04}: {w}  {}", fmt_decoded(&dec.decode(*w)));
    }
    buf
}
