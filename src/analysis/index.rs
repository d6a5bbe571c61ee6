// Copyright (c) 2022-2023 the cflow authors

//! Label and jump indexing, and label validation.
//!
//! The index is built once per analysis run in a single pass over the
//! instruction sequence. Validation consumes it to diagnose jumps to
//! undefined labels (fatal, batched) and defined labels no jump ever
//! references (advisory).

use crate::{
    diag::{Category, Diagnostics},
    ir::{is_synthetic, Inst},
};
use std::collections::{HashMap, HashSet};

/// An index of the labels and jumps of one instruction sequence.
///
/// Pure data collection; maps each label name to the index of its defining
/// instruction and each jump target to the indices of the jumps that
/// reference it. Duplicate label definitions are not diagnosed here, the
/// last definition wins.
#[derive(Debug, Default)]
pub struct LabelIndex {
    labels: HashMap<String, usize>,
    jumps: HashMap<String, Vec<usize>>,
}

impl LabelIndex {
    /// Build the index for an instruction sequence.
    pub fn new(insts: &[Inst]) -> Self {
        let mut index = LabelIndex::default();
        for (i, inst) in insts.iter().enumerate() {
            match inst {
                Inst::Label { name, .. } => {
                    index.labels.insert(name.clone(), i);
                }
                Inst::Jump { target, .. } => {
                    index.jumps.entry(target.clone()).or_default().push(i);
                }
                _ => (),
            }
        }
        index
    }

    /// Check whether a label is defined.
    pub fn defines(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Check whether any jump references a label.
    pub fn references(&self, name: &str) -> bool {
        self.jumps.contains_key(name)
    }
}

/// Validate the labels of an instruction sequence against the index.
///
/// Reports one fatal diagnostic per jump to an undefined label and one
/// warning per defined, non-synthetic label that is never referenced. Both
/// checks complete their full scan regardless of findings, so a single run
/// gives the user the complete picture; the caller aborts the analysis of
/// the function afterwards if any fatal diagnostic was emitted.
///
/// Returns `false` if an unknown label was found.
pub fn validate_labels(
    index: &LabelIndex,
    insts: &[Inst],
    return_label: &str,
    diags: &mut Diagnostics,
) -> bool {
    let mut ok = true;

    // Unknown labels, one diagnostic per referencing jump, in source order.
    for inst in insts {
        if let Inst::Jump { loc, target, .. } = inst {
            if target != return_label && !index.defines(target) {
                diags.fatal(
                    *loc,
                    Category::UnknownLabel,
                    format!("Unknown label »{}«", target),
                );
                ok = false;
            }
        }
    }

    // Unused labels, in source order. This runs even when unknown labels
    // were found. Duplicate definitions warn only once. The return label is
    // exempt like synthetic names: it is injected, not written by the user.
    let mut checked = HashSet::new();
    for inst in insts {
        if let Inst::Label { loc, name, .. } = inst {
            if is_synthetic(name) || name == return_label || !checked.insert(name.as_str()) {
                continue;
            }
            if !index.references(name) {
                diags.warn(
                    *loc,
                    Category::UnusedLabel,
                    format!("Unused label »{}«", name),
                );
            }
        }
    }

    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Loc;

    fn label(name: &str) -> Inst {
        Inst::Label {
            loc: Loc::new(1, 1),
            name: name.into(),
        }
    }

    fn goto(target: &str) -> Inst {
        Inst::Jump {
            loc: Loc::new(2, 1),
            target: target.into(),
            conditional: false,
        }
    }

    #[test]
    fn one_diagnostic_per_referencing_jump() {
        let insts = vec![goto("missing"), goto("missing"), label(".ret.0")];
        let index = LabelIndex::new(&insts);
        let mut diags = Diagnostics::new();
        assert!(!validate_labels(&index, &insts, ".ret.0", &mut diags));
        assert_eq!(
            diags
                .iter()
                .filter(|d| d.category == Category::UnknownLabel)
                .count(),
            2
        );
    }

    #[test]
    fn return_label_is_exempt() {
        let insts = vec![goto(".ret.0"), label(".ret.0")];
        let index = LabelIndex::new(&insts);
        let mut diags = Diagnostics::new();
        assert!(validate_labels(&index, &insts, ".ret.0", &mut diags));
        assert!(diags.is_empty());
    }

    #[test]
    fn non_synthetic_return_label_is_not_unused() {
        let insts = vec![label("RET")];
        let index = LabelIndex::new(&insts);
        let mut diags = Diagnostics::new();
        assert!(validate_labels(&index, &insts, "RET", &mut diags));
        assert!(diags.is_empty());
    }

    #[test]
    fn unused_label_warns_once() {
        let insts = vec![label("lonely"), label(".internal")];
        let index = LabelIndex::new(&insts);
        let mut diags = Diagnostics::new();
        assert!(validate_labels(&index, &insts, ".ret.0", &mut diags));
        let unused: Vec<_> = diags
            .iter()
            .filter(|d| d.category == Category::UnusedLabel)
            .collect();
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("lonely"));
    }
}
