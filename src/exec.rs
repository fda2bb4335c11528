use crate::cpu::{Cpu, Trap};
use crate::decoder::{Decoded, Op};
use crate::instructions::{branch_offset, Location};
use crate::memory::Bus;

pub trait Executor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<(), Trap>;
}

/// The control unit's instruction semantics. Expects `cpu.pc` to already
/// point at the word after `d`.
pub struct LogicExecutor;

impl Executor for LogicExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<(), Trap> {
        let at = cpu.pc.saturating_sub(1);
        match d.op {
            Op::Nop => {}
            Op::Ld => cpu.rr = load(bus, d.operand, at)?,
            Op::Ldc => cpu.rr = !load(bus, d.operand, at)?,
            Op::And => cpu.rr &= load(bus, d.operand, at)?,
            Op::Andc => cpu.rr &= !load(bus, d.operand, at)?,
            Op::Or => cpu.rr |= load(bus, d.operand, at)?,
            Op::Orc => cpu.rr |= !load(bus, d.operand, at)?,
            Op::Xnor => cpu.rr = cpu.rr == load(bus, d.operand, at)?,
            Op::Sto => store(bus, d.operand, cpu.rr, at)?,
            Op::Stoc => store(bus, d.operand, !cpu.rr, at)?,
            // raw operand, not a pin lookup
            Op::Ien => cpu.ien = d.operand,
            Op::Oen => cpu.oen = d.operand,
            Op::Jmp => {
                let offset = branch_offset(d.operand);
                cpu.pc = cpu
                    .pc
                    .checked_add_signed(offset as isize)
                    .ok_or(Trap::JumpOutOfRange { pc: at, offset })?;
            }
            Op::Rtn => cpu.pc += 1,
            Op::Skz => {
                if !cpu.rr {
                    cpu.pc += 1;
                }
            }
        }
        Ok(())
    }
}

fn load<B: Bus>(bus: &B, operand: u8, at: usize) -> Result<bool, Trap> {
    bus.load(Location::select(operand))
        .map_err(|source| Trap::Bus { pc: at, source })
}

fn store<B: Bus>(bus: &mut B, operand: u8, val: bool, at: usize) -> Result<(), Trap> {
    bus.store(Location::select(operand), val)
        .map_err(|source| Trap::Bus { pc: at, source })
}
