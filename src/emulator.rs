//! A loaded program together with the machine state it runs on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::cpu::{Cpu, CpuConfig, Step, Trap};
use crate::exec::LogicExecutor;
use crate::isa::nibble::NibbleDecoder;
use crate::memory::{Bank, BusError, IoSpace};
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program counter ran off the end of the program.
    Halted { steps: u64 },
    /// The step budget ran out first; typical for control loops.
    BudgetExhausted { steps: u64 },
}

/// A single output pin assertion, written `"<pin>:<value>"` (e.g. `"2:1"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinSignal {
    pub pin: u8,
    pub value: bool,
}

impl fmt::Display for PinSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pin, self.value as u8)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid pin signal {0:?}, expected <pin>:<0|1>")]
pub struct ParseSignalError(String);

impl FromStr for PinSignal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSignalError(s.to_string());
        let (pin, value) = s.trim().split_once(':').ok_or_else(err)?;
        let pin = pin.trim().parse::<u8>().map_err(|_| err())?;
        let value = match value.trim() {
            "0" => false,
            "1" => true,
            _ => return Err(err()),
        };
        Ok(PinSignal { pin, value })
    }
}

/// Register, RAM and pin values at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub pc: usize,
    pub rr: u8,
    pub ien: u8,
    pub oen: u8,
    pub ram: BTreeMap<u8, u8>,
    pub inputs: BTreeMap<u8, u8>,
    pub outputs: BTreeMap<u8, u8>,
}

fn bank_map(bank: &Bank) -> BTreeMap<u8, u8> {
    bank.iter().map(|(a, v)| (a, v as u8)).collect()
}

impl Snapshot {
    pub fn signals(&self) -> Vec<PinSignal> {
        self.outputs
            .iter()
            .map(|(&pin, &v)| PinSignal { pin, value: v != 0 })
            .collect()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC = {}", self.pc)?;
        writeln!(f, "RR = {:#x}", self.rr)?;
        writeln!(f, "IEN = {:#x}", self.ien)?;
        writeln!(f, "OEN = {:#x}", self.oen)?;
        for (title, cells) in [("RAM", &self.ram), ("Input", &self.inputs), ("Output", &self.outputs)] {
            writeln!(f, "{title}:")?;
            // two rows: addresses below 4, then 4..=7
            let (low, high): (Vec<_>, Vec<_>) = cells.iter().partition(|&(a, _)| *a < 4);
            for row in [low, high] {
                let cols: Vec<String> = row.iter().map(|(a, v)| format!("{a}: {v:#x}")).collect();
                writeln!(f, "{}", cols.join(" "))?;
            }
        }
        Ok(())
    }
}

pub struct Emulator {
    pub cpu: Cpu,
    pub io: IoSpace,
    program: Program,
    dec: NibbleDecoder,
    exec: LogicExecutor,
}

impl Emulator {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, CpuConfig::default())
    }

    pub fn with_config(program: Program, cfg: CpuConfig) -> Self {
        Self {
            cpu: Cpu::new(cfg),
            io: IoSpace::new(),
            program,
            dec: NibbleDecoder::new(),
            exec: LogicExecutor,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> usize {
        self.cpu.pc
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.pc >= self.program.len()
    }

    /// Rewinds the program counter. RAM, pins and registers are kept.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    pub fn step(&mut self) -> Result<Step, Trap> {
        self.cpu
            .step(&self.program, &mut self.io, &self.dec, &self.exec)
    }

    pub fn set_input(&mut self, pin: u8, value: bool) -> Result<(), BusError> {
        self.io.set_input(pin, value)
    }

    pub fn output(&self, pin: u8) -> Result<bool, BusError> {
        self.io.outputs.get(pin)
    }

    pub fn ram(&self, addr: u8) -> Result<bool, BusError> {
        self.io.ram.get(addr)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.cpu.pc,
            rr: self.cpu.rr as u8,
            ien: self.cpu.ien,
            oen: self.cpu.oen,
            ram: bank_map(&self.io.ram),
            inputs: bank_map(&self.io.inputs),
            outputs: bank_map(&self.io.outputs),
        }
    }

    /// Runs under the configured step budget.
    pub fn run(&mut self) -> Result<RunOutcome, Trap> {
        self.run_for(self.cpu.cfg.step_budget)
    }

    pub fn run_for(&mut self, budget: u64) -> Result<RunOutcome, Trap> {
        let mut steps = 0;
        if self.is_halted() {
            return Ok(RunOutcome::Halted { steps });
        }
        while steps < budget {
            steps += 1;
            if self.step()?.is_halt() {
                return Ok(RunOutcome::Halted { steps });
            }
        }
        warn!(steps, pc = self.cpu.pc, "step budget exhausted");
        Ok(RunOutcome::BudgetExhausted { steps })
    }
}
