use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decoder::Op;

/// One 8-bit instruction word: opcode nibble high, operand nibble low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word(pub u8);

impl Word {
    pub fn from_nibbles(opcode: u8, operand: u8) -> Self {
        Word(((opcode & 0xF) << 4) | (operand & 0xF))
    }
    pub fn opcode(self) -> u8 {
        self.0 >> 4
    }
    pub fn operand(self) -> u8 {
        self.0 & 0xF
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// An (operation, operand) pair produced by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Op,
    pub operand: u8,
}

impl Instruction {
    pub fn new(op: Op, operand: u8) -> Self {
        Self {
            op,
            operand: operand & 0xF,
        }
    }

    pub fn encode(self) -> Word {
        Word::from_nibbles(self.op.opcode(), self.operand)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ProgramError {
    #[error("odd number of hex digits ({0}); every word takes two")]
    OddLength(usize),
    #[error("invalid hex digit {ch:?} at position {pos}")]
    InvalidDigit { pos: usize, ch: char },
}

/// An assembled program. Its text form is one lowercase hex digit pair per word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub words: Vec<Word>,
}

impl Program {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn from_instructions<I>(insns: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        Self {
            words: insns.into_iter().map(Instruction::encode).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Word> {
        self.words.get(index).copied()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for w in &self.words {
            write!(f, "{w}")?;
        }
        Ok(())
    }
}

impl FromStr for Program {
    type Err = ProgramError;

    /// Whitespace between digits is skipped so that wrapped dumps load back.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut nibbles = Vec::with_capacity(s.len());
        for (pos, ch) in s.char_indices() {
            if ch.is_whitespace() {
                continue;
            }
            let v = ch
                .to_digit(16)
                .ok_or(ProgramError::InvalidDigit { pos, ch })?;
            nibbles.push(v as u8);
        }
        if nibbles.len() % 2 != 0 {
            return Err(ProgramError::OddLength(nibbles.len()));
        }
        let words = nibbles
            .chunks_exact(2)
            .map(|p| Word::from_nibbles(p[0], p[1]))
            .collect();
        Ok(Program { words })
    }
}
