pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod emulator;
pub mod exec;
pub mod instructions;
pub mod macros;
pub mod memory;
pub mod program;

pub mod isa {
    pub mod nibble; // 4-bit opcode / 4-bit operand word
}

pub use asm::{assemble, AsmConfig, AsmError, Assembler, LineError};
pub use cpu::{Cpu, CpuConfig, Step, Trap};
pub use emulator::{Emulator, PinSignal, RunOutcome, Snapshot};
pub use memory::{Bus, IoSpace};
pub use program::{Instruction, Program, Word};
