use anyhow::{Context, Result};
use std::path::Path;

use ctrlunit_rs::macros::MacroTable;
use ctrlunit_rs::{AsmConfig, Assembler, Program};

/// How a program file on disk is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Source,
    Hex,
}

impl Input {
    /// `.asm`/`.s` files are source, anything else is taken as hex words.
    pub fn guess(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("asm") | Some("s") => Input::Source,
            _ => Input::Hex,
        }
    }
}

/// Reads a JSON macro table and merges it over the built-in one.
pub fn load_macros(path: &Path) -> Result<AsmConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading macro table {}", path.display()))?;
    let extra = MacroTable::from_json(&text)
        .with_context(|| format!("parsing macro table {}", path.display()))?;
    let mut cfg = AsmConfig::default();
    cfg.macros.extend(extra);
    Ok(cfg)
}

pub fn load_program(path: &Path, kind: Input, asm: &Assembler) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let program = match kind {
        Input::Source => asm.assemble_program(&text)?,
        Input::Hex => text.parse()?,
    };
    Ok(program)
}
