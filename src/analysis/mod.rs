// Copyright (c) 2022-2023 the cflow authors

//! Control-flow reconstruction and dead-code analysis.
//!
//! This module ties the stages of the analysis together: label indexing
//! and validation, block construction, reachability checking, and
//! dead-code stripping. The compiler driver invokes it once per function
//! body, after statement lowering and before code generation.

mod build;
mod dce;
mod index;

pub use build::BlockBuilder;
pub use dce::{eliminate_dead_code, mark_unreachable, strip_dead};
pub use index::{validate_labels, LabelIndex};

use crate::{
    cfg::{Block, ControlFlowGraph},
    diag::Diagnostics,
    ir::{Inst, Loc},
    session::Session,
};
use log::debug;
use std::fmt;

/// The analysis of a function could not be completed.
///
/// Raised when jumps reference labels that are never defined; without
/// resolved labels no block graph can be constructed. The individual
/// occurrences have already been reported through the diagnostic sink when
/// this error is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelResolutionError {
    /// The name of the offending function.
    pub function: String,
}

impl fmt::Display for LabelResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cannot analyze control flow of `{}`: unresolved labels",
            self.function
        )
    }
}

impl std::error::Error for LabelResolutionError {}

/// The control-flow analyzer.
///
/// Holds the block graph of the most recently analyzed function. All maps
/// and collections are rebuilt from scratch by every [`analyze`] call; only
/// the counters in the [`Session`] survive across calls. One analyzer
/// serves one function at a time, the driver processes functions
/// sequentially.
///
/// [`analyze`]: ControlFlowAnalyzer::analyze
pub struct ControlFlowAnalyzer<'s> {
    session: &'s mut Session,
    graph: ControlFlowGraph,
}

impl<'s> ControlFlowAnalyzer<'s> {
    /// Create an analyzer drawing on the given session.
    pub fn new(session: &'s mut Session) -> Self {
        ControlFlowAnalyzer {
            session,
            graph: ControlFlowGraph::new(),
        }
    }

    /// Analyze one function body and return the trimmed instruction
    /// sequence.
    ///
    /// Appends a label for the function's unified return point (unless the
    /// sequence already ends with it, which makes repeated trimming
    /// idempotent), validates label usage, reconstructs the block graph,
    /// and reduces unreachable blocks to their retained markers. The
    /// trimmed sequence keeps the original instruction order; the block
    /// graph remains available through [`graph`](Self::graph) afterwards.
    ///
    /// Returns an error after reporting every occurrence if any jump
    /// references an undefined label.
    pub fn analyze(
        &mut self,
        loc: Loc,
        function: &str,
        mut insts: Vec<Inst>,
        return_label: &str,
        diags: &mut Diagnostics,
    ) -> Result<Vec<Inst>, LabelResolutionError> {
        debug!("analyzing control flow of {}", function);

        let already_terminated = match insts.last() {
            Some(Inst::Label { name, .. }) => name == return_label,
            _ => false,
        };
        if !already_terminated {
            insts.push(Inst::Label {
                loc,
                name: return_label.to_string(),
            });
        }

        let label_index = LabelIndex::new(&insts);
        if !validate_labels(&label_index, &insts, return_label, diags) {
            return Err(LabelResolutionError {
                function: function.to_string(),
            });
        }

        let mut graph = BlockBuilder::new(self.session).build(function, return_label, insts);
        let trimmed = eliminate_dead_code(&mut graph, diags);
        self.graph = graph;
        Ok(trimmed)
    }

    /// Return the block graph of the most recently analyzed function.
    pub fn graph(&self) -> &ControlFlowGraph {
        &self.graph
    }

    /// Return the entry block of the most recently analyzed function.
    pub fn entry(&self) -> Option<Block> {
        self.graph.entry()
    }
}
