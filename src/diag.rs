// Copyright (c) 2022-2023 the cflow authors

//! Diagnostics emitted by the analysis.
//!
//! The analysis never prints anything itself. It reports findings into a
//! [`Diagnostics`] sink owned by the compiler driver, which decides how to
//! render them. Warnings are suppressible per category; fatal diagnostics
//! are batched so the user sees every occurrence in one compiler run before
//! the analysis of the offending function aborts.

use crate::ir::Loc;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory; never interrupts the pipeline.
    Warning,
    /// Recoverable error.
    Error,
    /// Unrecoverable for the current function.
    Fatal,
}

/// The machine-checkable category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// A jump references a label that is never defined.
    UnknownLabel,
    /// A defined label is never referenced by any jump.
    UnusedLabel,
    /// A block of code can never be reached.
    DeadCode,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Category::UnknownLabel => "unknown-label",
            Category::UnusedLabel => "unused-label",
            Category::DeadCode => "dead-code",
        };
        write!(f, "{}", name)
    }
}

bitflags! {
    /// Warning categories that can be suppressed individually.
    #[derive(Default, Serialize, Deserialize)]
    pub struct Suppress: u32 {
        const UNUSED_LABEL = 1 << 0;
        const DEAD_CODE = 1 << 1;
    }
}

impl Category {
    fn suppress_flag(self) -> Suppress {
        match self {
            Category::UnusedLabel => Suppress::UNUSED_LABEL,
            Category::DeadCode => Suppress::DEAD_CODE,
            // Errors are never suppressible.
            Category::UnknownLabel => Suppress::empty(),
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Where the diagnostic points at.
    pub loc: Loc,
    /// How severe the finding is.
    pub severity: Severity,
    /// The machine-checkable category.
    pub category: Category,
    /// The human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "error",
        };
        write!(
            f,
            "{}: {} [{}]: {}",
            self.loc, severity, self.category, self.message
        )
    }
}

/// A collecting diagnostic sink.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
    suppress: Suppress,
}

impl Diagnostics {
    /// Create a new, empty sink.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a sink with the given warning categories suppressed.
    pub fn with_suppressed(suppress: Suppress) -> Self {
        Diagnostics {
            diags: vec![],
            suppress,
        }
    }

    /// Report a warning. Dropped if its category is suppressed.
    pub fn warn(&mut self, loc: Loc, category: Category, message: impl Into<String>) {
        let flag = category.suppress_flag();
        if !flag.is_empty() && self.suppress.contains(flag) {
            return;
        }
        self.diags.push(Diagnostic {
            loc,
            severity: Severity::Warning,
            category,
            message: message.into(),
        });
    }

    /// Report a fatal error. Fatal errors are batched; the caller decides
    /// when to stop.
    pub fn fatal(&mut self, loc: Loc, category: Category, message: impl Into<String>) {
        self.diags.push(Diagnostic {
            loc,
            severity: Severity::Fatal,
            category,
            message: message.into(),
        });
    }

    /// Check whether the sink holds no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Return the number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Check whether any fatal diagnostic was collected.
    pub fn has_fatal(&self) -> bool {
        self.diags.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Iterate over the collected diagnostics, in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for diag in &self.diags {
            writeln!(f, "- {}", diag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression() {
        let mut diags = Diagnostics::with_suppressed(Suppress::DEAD_CODE);
        diags.warn(Loc::new(1, 1), Category::DeadCode, "Code is unreachable");
        diags.warn(Loc::new(2, 1), Category::UnusedLabel, "Unused label »x«");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().category, Category::UnusedLabel);
    }

    #[test]
    fn fatal_is_batched() {
        let mut diags = Diagnostics::new();
        diags.fatal(Loc::new(1, 1), Category::UnknownLabel, "Unknown label »a«");
        diags.fatal(Loc::new(2, 1), Category::UnknownLabel, "Unknown label »a«");
        assert!(diags.has_fatal());
        assert_eq!(diags.len(), 2);
    }
}
