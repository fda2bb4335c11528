//! Macro definitions and their expansion into basic instructions.
//!
//! A macro is an ordered list of steps. Each step names a target, either a
//! basic mnemonic or another macro, plus argument specifiers: a literal hex
//! digit, or a back-reference `-k` to the k-th actual argument of the
//! invocation being expanded.
//!
//! Expansion runs on an explicit frame stack with a depth limit, so a table
//! that slipped past [`MacroTable::validate`] with a cycle in it fails with
//! [`AsmError::MacroDepthExceeded`] instead of overflowing the call stack.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asm::{parse_operand, AsmError};
use crate::instructions::by_mnemonic;
use crate::program::Instruction;

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    /// Hex digit value, 0..=15.
    Literal(u8),
    /// 1-based index into the invocation's actual arguments.
    BackRef(usize),
}

impl ArgSpec {
    /// Table encoding: non-negative is a literal, `-k` a back-reference.
    pub fn from_raw(raw: i64) -> Result<Self, AsmError> {
        match raw {
            0..=15 => Ok(ArgSpec::Literal(raw as u8)),
            r if r < 0 => Ok(ArgSpec::BackRef(r.unsigned_abs() as usize)),
            r => Err(AsmError::InvalidOperand {
                token: r.to_string(),
            }),
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            ArgSpec::Literal(v) => v as i64,
            ArgSpec::BackRef(k) => -(k as i64),
        }
    }

    fn resolve(self, macro_name: &str, actual: &[u8]) -> Result<u8, AsmError> {
        match self {
            ArgSpec::Literal(v) => Ok(v),
            ArgSpec::BackRef(k) => {
                k.checked_sub(1)
                    .and_then(|i| actual.get(i))
                    .copied()
                    .ok_or_else(|| AsmError::TooFewArguments {
                        macro_name: macro_name.to_string(),
                        index: k,
                        supplied: actual.len(),
                    })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroStep {
    pub target: String,
    pub args: Vec<ArgSpec>,
}

impl MacroStep {
    pub fn call<I>(target: &str, args: I) -> Self
    where
        I: IntoIterator<Item = ArgSpec>,
    {
        Self {
            target: target.to_string(),
            args: args.into_iter().collect(),
        }
    }

    /// A step with no specifiers; the target's default operand applies.
    pub fn bare(target: &str) -> Self {
        Self::call(target, [])
    }
}

// A step is written either as a bare target name or as `[target, spec, ...]`.
impl Serialize for MacroStep {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if self.args.is_empty() {
            return s.serialize_str(&self.target);
        }
        let mut seq = s.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(&self.target)?;
        for a in &self.args {
            seq.serialize_element(&a.to_raw())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for MacroStep {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct StepVisitor;

        impl<'de> Visitor<'de> for StepVisitor {
            type Value = MacroStep;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a target name or an array [target, spec, ...]")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MacroStep, E> {
                Ok(MacroStep::bare(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MacroStep, A::Error> {
                let target: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut args = Vec::new();
                while let Some(raw) = seq.next_element::<i64>()? {
                    args.push(ArgSpec::from_raw(raw).map_err(de::Error::custom)?);
                }
                Ok(MacroStep { target, args })
            }
        }

        d.deserialize_any(StepVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroTable {
    macros: BTreeMap<String, Vec<MacroStep>>,
}

impl MacroTable {
    /// The stock convenience macros.
    pub fn builtin() -> Self {
        use ArgSpec::{BackRef, Literal};

        let mut t = MacroTable::default();
        t.insert("nand", vec![MacroStep::call("andc", [BackRef(1)])]);
        t.insert("nor", vec![MacroStep::call("orc", [BackRef(1)])]);
        t.insert(
            "jz",
            vec![MacroStep::bare("skz"), MacroStep::call("jmp", [BackRef(1)])],
        );
        t.insert(
            "jnz",
            vec![
                MacroStep::call("skz", [Literal(1)]),
                MacroStep::call("jmp", [Literal(1)]),
                MacroStep::bare("nop"),
                MacroStep::bare("nop"),
                MacroStep::bare("nop"),
                MacroStep::call("jmp", [BackRef(1)]),
            ],
        );
        t.insert(
            "xor",
            vec![
                MacroStep::call("xnor", [BackRef(1)]),
                MacroStep::call("ldc", [Literal(0)]),
            ],
        );
        t
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Adds or replaces a definition. No validation happens here.
    pub fn insert(&mut self, name: &str, steps: Vec<MacroStep>) {
        self.macros.insert(name.to_string(), steps);
    }

    /// Copies every definition of `other` into `self`, replacing clashes.
    pub fn extend(&mut self, other: MacroTable) {
        self.macros.extend(other.macros);
    }

    pub fn get(&self, name: &str) -> Option<&[MacroStep]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Checks every step statically and rejects reference cycles.
    pub fn validate(&self) -> Result<(), AsmError> {
        for (name, steps) in &self.macros {
            for step in steps {
                if let Some(desc) = by_mnemonic(&step.target) {
                    if step.args.len() > 1 {
                        return Err(AsmError::TooManyArguments {
                            target: step.target.clone(),
                            max: 1,
                            found: step.args.len(),
                        });
                    }
                    if step.args.is_empty() && desc.default_operand.is_none() {
                        return Err(AsmError::MissingOperand {
                            mnemonic: step.target.clone(),
                        });
                    }
                } else if !self.macros.contains_key(&step.target) {
                    return Err(AsmError::UnknownMacroTarget {
                        macro_name: name.clone(),
                        target: step.target.clone(),
                    });
                }
            }
        }

        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for name in self.macros.keys() {
            self.visit(name, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<(), AsmError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(AsmError::MacroCycle { path: cycle });
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        path.push(name);
        for step in self.get(name).unwrap_or_default() {
            // basic mnemonics shadow macros of the same name
            if by_mnemonic(&step.target).is_none() && self.contains(&step.target) {
                self.visit(&step.target, marks, path)?;
            }
        }
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Frame<'t> {
    name: &'t str,
    steps: std::slice::Iter<'t, MacroStep>,
    args: Vec<u8>,
}

/// Expands macro invocations against one table.
pub struct Expander<'t> {
    table: &'t MacroTable,
    max_depth: usize,
}

impl<'t> Expander<'t> {
    pub fn new(table: &'t MacroTable) -> Self {
        Self {
            table,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expands `name` invoked with source tokens. A token is parsed only
    /// when one of the macro's steps back-references it.
    pub fn expand_tokens(&self, name: &str, tokens: &[&str]) -> Result<Vec<Instruction>, AsmError> {
        let steps = self
            .table
            .get(name)
            .ok_or_else(|| AsmError::UnknownInstruction {
                mnemonic: name.to_string(),
            })?;
        let referenced: BTreeSet<usize> = steps
            .iter()
            .flat_map(|s| &s.args)
            .filter_map(|a| match a {
                ArgSpec::BackRef(k) => Some(*k),
                ArgSpec::Literal(_) => None,
            })
            .collect();
        // unreferenced slots keep their position so arity checks still count them
        let actual = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if referenced.contains(&(i + 1)) {
                    parse_operand(t)
                } else {
                    Ok(0)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.expand(name, &actual)
    }

    /// Expands `name` invoked with already-parsed actual arguments into
    /// basic instructions only.
    pub fn expand(&self, name: &str, args: &[u8]) -> Result<Vec<Instruction>, AsmError> {
        let (name, steps) = self
            .table
            .macros
            .get_key_value(name)
            .ok_or_else(|| AsmError::UnknownInstruction {
                mnemonic: name.to_string(),
            })?;

        let mut out = Vec::new();
        let mut stack = vec![Frame {
            name,
            steps: steps.iter(),
            args: args.to_vec(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(step) = frame.steps.next() else {
                stack.pop();
                continue;
            };

            if let Some(desc) = by_mnemonic(&step.target) {
                let operand = match step.args.as_slice() {
                    [] => desc
                        .default_operand
                        .ok_or_else(|| AsmError::MissingOperand {
                            mnemonic: step.target.clone(),
                        })?,
                    [spec] => spec.resolve(frame.name, &frame.args)?,
                    more => {
                        return Err(AsmError::TooManyArguments {
                            target: step.target.clone(),
                            max: 1,
                            found: more.len(),
                        })
                    }
                };
                out.push(Instruction::new(desc.op, operand));
            } else if let Some((child, child_steps)) =
                self.table.macros.get_key_value(step.target.as_str())
            {
                let child_args = step
                    .args
                    .iter()
                    .map(|s| s.resolve(frame.name, &frame.args))
                    .collect::<Result<Vec<_>, _>>()?;
                if stack.len() >= self.max_depth {
                    return Err(AsmError::MacroDepthExceeded {
                        name: child.clone(),
                        limit: self.max_depth,
                    });
                }
                stack.push(Frame {
                    name: child,
                    steps: child_steps.iter(),
                    args: child_args,
                });
            } else {
                return Err(AsmError::UnknownMacroTarget {
                    macro_name: frame.name.to_string(),
                    target: step.target.clone(),
                });
            }
        }

        Ok(out)
    }
}
