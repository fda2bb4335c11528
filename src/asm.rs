//! Line-oriented assembler.
//!
//! Source is one instruction per line, `;` starts a comment. A line is a
//! mnemonic followed by its operand tokens; basic mnemonics encode directly,
//! anything else must name a macro from the configured [`MacroTable`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::instructions::by_mnemonic;
use crate::macros::{Expander, MacroTable, DEFAULT_MAX_DEPTH};
use crate::program::{Instruction, Program};

/// Operand alias for input pin 0, which idles at the complement of RR's reset value.
pub const RR_ALIAS: &str = "!rr";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("unknown instruction: {mnemonic}")]
    UnknownInstruction { mnemonic: String },
    #[error("unknown instruction {target} in expansion of macro {macro_name}")]
    UnknownMacroTarget { macro_name: String, target: String },
    #[error("too many arguments for {target}: takes at most {max}, got {found}")]
    TooManyArguments {
        target: String,
        max: usize,
        found: usize,
    },
    #[error("too few arguments for macro {macro_name}: argument {index} referenced, {supplied} supplied")]
    TooFewArguments {
        macro_name: String,
        index: usize,
        supplied: usize,
    },
    #[error("{mnemonic} requires an operand")]
    MissingOperand { mnemonic: String },
    #[error("invalid operand {token:?}: expected a hex digit 0-f or !rr")]
    InvalidOperand { token: String },
    #[error("macro reference cycle: {}", .path.join(" -> "))]
    MacroCycle { path: Vec<String> },
    #[error("macro expansion exceeds {limit} levels at {name}")]
    MacroDepthExceeded { name: String, limit: usize },
}

/// An [`AsmError`] tagged with the 1-based source line it came from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{source} on line {line}")]
pub struct LineError {
    pub line: usize,
    #[source]
    pub source: AsmError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    pub max_macro_depth: usize,
    pub macros: MacroTable,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            max_macro_depth: DEFAULT_MAX_DEPTH,
            macros: MacroTable::builtin(),
        }
    }
}

/// Parses one operand token: a hex value 0..=15 (optional `0x`, leading
/// zeros allowed) or the `!rr` alias.
pub fn parse_operand(token: &str) -> Result<u8, AsmError> {
    if token.eq_ignore_ascii_case(RR_ALIAS) {
        return Ok(0);
    }
    let invalid = || AsmError::InvalidOperand {
        token: token.to_string(),
    };
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    match u8::from_str_radix(digits, 16) {
        Ok(v) if v <= 0xF => Ok(v),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    cfg: AsmConfig,
}

impl Assembler {
    /// Assembler with the built-in macro table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configured macro table before accepting it.
    pub fn with_config(cfg: AsmConfig) -> Result<Self, AsmError> {
        cfg.macros.validate()?;
        Ok(Self { cfg })
    }

    pub fn macros(&self) -> &MacroTable {
        &self.cfg.macros
    }

    pub fn assemble_line(&self, line: &str) -> Result<Vec<Instruction>, AsmError> {
        let code = match line.find(';') {
            Some(p) => &line[..p],
            None => line,
        };
        let mut tokens = code.split_whitespace();
        let Some(mnemonic) = tokens.next() else {
            return Ok(Vec::new());
        };
        let args: Vec<&str> = tokens.collect();
        trace!(mnemonic, ?args, "tokenised line");

        if let Some(desc) = by_mnemonic(mnemonic) {
            let operand = match args.as_slice() {
                [] => desc
                    .default_operand
                    .ok_or_else(|| AsmError::MissingOperand {
                        mnemonic: desc.mnemonic.to_string(),
                    })?,
                [tok] => parse_operand(tok)?,
                more => {
                    return Err(AsmError::TooManyArguments {
                        target: desc.mnemonic.to_string(),
                        max: 1,
                        found: more.len(),
                    })
                }
            };
            return Ok(vec![Instruction::new(desc.op, operand)]);
        }

        let name = mnemonic.to_ascii_lowercase();
        if self.cfg.macros.contains(&name) {
            return Expander::new(&self.cfg.macros)
                .with_max_depth(self.cfg.max_macro_depth)
                .expand_tokens(&name, &args);
        }

        Err(AsmError::UnknownInstruction {
            mnemonic: mnemonic.to_string(),
        })
    }

    /// Assembles a whole source text, stopping at the first bad line.
    pub fn assemble_program(&self, text: &str) -> Result<Program, LineError> {
        let mut insns = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let mut out = self
                .assemble_line(line)
                .map_err(|source| LineError {
                    line: idx + 1,
                    source,
                })?;
            insns.append(&mut out);
        }
        debug!(words = insns.len(), "assembled program");
        Ok(Program::from_instructions(insns))
    }
}

/// Assembles `text` with the built-in macro table.
pub fn assemble(text: &str) -> Result<Program, LineError> {
    Assembler::new().assemble_program(text)
}
