use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decoder::Decoder;
use crate::disasm::fmt_decoded;
use crate::exec::Executor;
use crate::memory::{Bus, BusError};
use crate::program::Program;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Steps `Emulator::run` executes before giving up on a looping program.
    pub step_budget: u64,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            step_budget: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: usize, // word index into the program
    pub rr: bool,  // 1-bit accumulator
    pub ien: u8,
    pub oen: u8,
    pub cfg: CpuConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Program counter {pc} is past the end of the program ({len} words)")]
    PcOutOfRange { pc: usize, len: usize },
    #[error("Jump at word {pc} by {offset} words lands before the program start")]
    JumpOutOfRange { pc: usize, offset: i32 },
    #[error("Bus error at word {pc}: {source}")]
    Bus {
        pc: usize,
        #[source]
        source: BusError,
    },
}

/// What the caller should do after a step.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The program counter left the program; there is nothing more to fetch.
    Halt,
}

impl Step {
    pub fn is_halt(self) -> bool {
        self == Step::Halt
    }
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            pc: 0,
            rr: false,
            ien: 0,
            oen: 0,
            cfg,
        }
    }

    pub fn reset(&mut self) {
        self.pc = 0;
    }

    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        program: &Program,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<Step, Trap> {
        let pc = self.pc;
        let word = program.get(pc).ok_or(Trap::PcOutOfRange {
            pc,
            len: program.len(),
        })?;
        let d = dec.decode(word);
        debug!(pc, word = %word, insn = %fmt_decoded(&d), "step");
        self.pc = pc + 1;
        // a trapped word is not retired: pc stays on it
        if let Err(trap) = exec.exec(self, bus, d) {
            self.pc = pc;
            return Err(trap);
        }
        Ok(if self.pc < program.len() {
            Step::Continue
        } else {
            Step::Halt
        })
    }
}
