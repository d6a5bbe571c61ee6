// Copyright (c) 2022-2023 the cflow authors

//! The linear intermediate representation consumed by the analysis.
//!
//! Statement lowering produces a flat sequence of instructions per function
//! body, with control flow expressed through explicit `label` and `jump`
//! pseudo-instructions. This module defines the closed set of instruction
//! shapes the analysis distinguishes; everything it does not recognize is
//! carried through verbatim as opaque payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The prefix reserved for compiler-generated label names.
///
/// Labels carrying this prefix never appear in user code and are excluded
/// from unused-label and unreachable-code diagnostics.
pub const SYNTHETIC_PREFIX: char = '.';

/// Check whether a label name is compiler-generated.
pub fn is_synthetic(name: &str) -> bool {
    name.starts_with(SYNTHETIC_PREFIX)
}

/// A source location, used to position diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    /// The 1-based line number.
    pub line: u32,
    /// The 1-based column number.
    pub column: u32,
}

impl Loc {
    /// Create a new source location.
    pub fn new(line: u32, column: u32) -> Self {
        Loc { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single instruction in the linear IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inst {
    /// A label definition, the target of jumps.
    Label { loc: Loc, name: String },
    /// A jump to a label.
    ///
    /// Unconditional jumps always transfer control to `target`. Conditional
    /// jumps transfer control to `target` when their lowered condition does
    /// not hold, and fall through otherwise.
    Jump {
        loc: Loc,
        target: String,
        conditional: bool,
    },
    /// A side-effect-free bookkeeping instruction.
    ///
    /// Markers encode scope and lifetime boundaries consumed by later
    /// stages and must survive even inside unreachable code.
    Marker { loc: Loc, text: String },
    /// Any other instruction; opaque to the analysis.
    Other { loc: Loc, text: String },
}

impl Inst {
    /// Return the source location of this instruction.
    pub fn loc(&self) -> Loc {
        match *self {
            Inst::Label { loc, .. }
            | Inst::Jump { loc, .. }
            | Inst::Marker { loc, .. }
            | Inst::Other { loc, .. } => loc,
        }
    }

    /// Check whether this is a marker instruction.
    pub fn is_marker(&self) -> bool {
        match self {
            Inst::Marker { .. } => true,
            _ => false,
        }
    }

    /// Check whether this is a jump instruction.
    pub fn is_jump(&self) -> bool {
        match self {
            Inst::Jump { .. } => true,
            _ => false,
        }
    }

    /// Return the label name associated with this instruction, if any.
    ///
    /// This is the defined name for labels and the target name for jumps.
    pub fn label_name(&self) -> Option<&str> {
        match self {
            Inst::Label { name, .. } => Some(name),
            Inst::Jump { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Inst::Label { name, .. } => write!(f, "{}:", name),
            Inst::Jump {
                target,
                conditional: true,
                ..
            } => write!(f, "branch {}", target),
            Inst::Jump {
                target,
                conditional: false,
                ..
            } => write!(f, "goto {}", target),
            Inst::Marker { text, .. } => write!(f, "free {}", text),
            Inst::Other { text, .. } => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_names() {
        assert!(is_synthetic(".L0"));
        assert!(is_synthetic(".ret.3"));
        assert!(!is_synthetic("loop_top"));
        assert!(!is_synthetic(""));
    }

    #[test]
    fn label_names() {
        let loc = Loc::new(1, 1);
        let label = Inst::Label {
            loc,
            name: "a".into(),
        };
        let jump = Inst::Jump {
            loc,
            target: "b".into(),
            conditional: true,
        };
        let other = Inst::Other {
            loc,
            text: "x = y".into(),
        };
        assert_eq!(label.label_name(), Some("a"));
        assert_eq!(jump.label_name(), Some("b"));
        assert_eq!(other.label_name(), None);
    }
}
