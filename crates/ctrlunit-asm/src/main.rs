use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ctrlunit_rs::disasm::listing;
use ctrlunit_rs::isa::nibble::NibbleDecoder;
use ctrlunit_rs::{AsmConfig, Assembler};

use ctrlunit_asm::{load_macros, load_program, Input};

#[derive(Parser, Debug)]
#[command(author, version, about = "Control unit macro assembler", long_about = None)]
struct Cli {
    /// JSON macro table merged over the built-in macros
    #[arg(long, value_name = "FILE", global = true)]
    macros: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file into hex words
    Assemble {
        #[arg(value_name = "SRC")]
        input: PathBuf,
        /// Write output to file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Disassemble a program, one word per line
    Listing {
        #[arg(value_name = "FILE")]
        input: PathBuf,
        /// Force the input to be read as assembly source
        #[arg(long)]
        source: bool,
    },
    /// Print the active macro table as JSON
    Macros,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.macros {
        Some(path) => load_macros(path)?,
        None => AsmConfig::default(),
    };
    let asm = Assembler::with_config(cfg)?;

    match cli.cmd {
        Command::Assemble { input, out } => {
            let program = load_program(&input, Input::Source, &asm)?;
            match out {
                Some(path) => std::fs::write(path, format!("{program}\n"))?,
                None => println!("{program}"),
            }
        }
        Command::Listing { input, source } => {
            let kind = if source { Input::Source } else { Input::guess(&input) };
            let program = load_program(&input, kind, &asm)?;
            print!("{}", listing(&program, &NibbleDecoder::new()));
        }
        Command::Macros => {
            println!("{}", serde_json::to_string_pretty(asm.macros())?);
        }
    }

    Ok(())
}
