use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ctrlunit_rs::{Assembler, CpuConfig, Emulator, PinSignal, Program, RunOutcome};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DumpFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a control unit program on the ctrlunit-rs emulator"
)]
struct Opts {
    /// Treat the input as assembly source instead of hex words
    #[arg(short, long)]
    source: bool,
    /// Step budget; looping programs stop here
    #[arg(long)]
    steps: Option<u64>,
    /// Input pin assignment applied before the first step, e.g. `3:1`
    #[arg(short, long = "input", value_name = "PIN:BIT")]
    inputs: Vec<PinSignal>,
    /// Final state dump format
    #[arg(long, value_enum, default_value_t = DumpFormat::Text)]
    format: DumpFormat,
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let text = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let program: Program = if opts.source {
        Assembler::new().assemble_program(&text)?
    } else {
        text.parse()?
    };

    let mut cfg = CpuConfig::default();
    if let Some(n) = opts.steps {
        cfg.step_budget = n;
    }
    let mut emu = Emulator::with_config(program, cfg);
    for s in &opts.inputs {
        emu.set_input(s.pin, s.value)?;
    }

    match emu.run() {
        Ok(RunOutcome::Halted { steps }) => eprintln!("halted after {steps} steps"),
        Ok(RunOutcome::BudgetExhausted { steps }) => eprintln!("stopped after {steps} steps (budget)"),
        Err(trap) => eprintln!("TRAP: {trap}"),
    }

    let snap = emu.snapshot();
    match opts.format {
        DumpFormat::Text => {
            print!("{snap}");
            let signals: Vec<String> = snap.signals().iter().map(|s| s.to_string()).collect();
            println!("Signals: {}", signals.join(" "));
        }
        DumpFormat::Json => println!("{}", serde_json::to_string_pretty(&snap)?),
    }

    Ok(())
}
