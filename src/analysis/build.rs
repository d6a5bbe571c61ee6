// Copyright (c) 2022-2023 the cflow authors

//! Basic block construction.
//!
//! A single forward pass over the instruction sequence partitions it into
//! named blocks and records the control edges between them. The walk keeps
//! a small state machine: the name of the block currently being
//! accumulated, a pair of flags noting whether the previous substantive
//! instruction was a conditional or unconditional jump, and a buffer of
//! pending instructions.
//!
//! Edge direction convention for conditional jumps: the fallthrough
//! continuation receives the branch-not-taken edge and the literal jump
//! target the branch-taken edge. This mirrors the convention downstream
//! consumers expect and is kept as is, even though the lowered jump fires
//! when its condition does not hold.

use crate::{
    cfg::{Block, BlockKind, ControlFlowGraph, Edge, EdgeKind},
    ir::Inst,
    session::Session,
};
use log::{debug, trace};
use std::mem;

/// Builds the block graph for one function body.
pub struct BlockBuilder<'s> {
    session: &'s mut Session,
    graph: ControlFlowGraph,
    edges: Vec<Edge>,
    buffer: Vec<Inst>,
    current: String,
    jumped_cond: bool,
    jumped_goto: bool,
}

impl<'s> BlockBuilder<'s> {
    /// Create a builder drawing synthetic names from the given session.
    pub fn new(session: &'s mut Session) -> Self {
        BlockBuilder {
            session,
            graph: ControlFlowGraph::new(),
            edges: vec![],
            buffer: vec![],
            current: String::new(),
            jumped_cond: false,
            jumped_goto: false,
        }
    }

    /// Partition an instruction sequence into blocks.
    ///
    /// The sequence must already carry the injected return-point label as
    /// its final instruction. The first block is named after the function
    /// and is the entry block; every recorded edge is resolved onto the
    /// block successor fields before the graph is returned.
    pub fn build(
        mut self,
        function: &str,
        return_label: &str,
        insts: Vec<Inst>,
    ) -> ControlFlowGraph {
        debug!("building block graph for {}", function);
        self.current = function.to_string();

        for i in 0..insts.len() {
            match &insts[i] {
                Inst::Label { name, .. } => {
                    let name = name.clone();
                    if self.jumped_cond || self.jumped_goto {
                        // No fallthrough exists into this label: the jump
                        // already chose it as the continuation name via
                        // lookahead. The label merely renames the current
                        // block, no edge is recorded.
                        self.jumped_cond = false;
                        self.jumped_goto = false;
                    } else {
                        let closed = mem::replace(&mut self.current, name.clone());
                        let closed_bb = self.close_block(&closed);
                        self.edge(closed_bb, name, EdgeKind::Fallthrough);
                    }
                    self.buffer.push(insts[i].clone());
                }
                Inst::Jump {
                    target,
                    conditional,
                    ..
                } => {
                    let target = target.clone();
                    let conditional = *conditional;
                    self.jumped_cond = conditional;
                    self.jumped_goto = !conditional;
                    self.buffer.push(insts[i].clone());

                    // Find the continuation the jump may fall through to:
                    // the next label, skipping markers, or a fresh
                    // synthetic name if something else follows.
                    let continuation = match lookahead_label(&insts[i + 1..]) {
                        Some(name) => name.to_string(),
                        None => self.session.synthetic_block_name(),
                    };
                    let closed = mem::replace(&mut self.current, continuation);
                    let closed_bb = self.close_block(&closed);

                    if conditional {
                        self.edge(closed_bb, self.current.clone(), EdgeKind::BranchNotTaken);
                        self.edge(closed_bb, target, EdgeKind::BranchTaken);
                    } else {
                        self.edge(closed_bb, target, EdgeKind::Fallthrough);
                    }
                }
                Inst::Marker { .. } => {
                    // Markers are transparent to the jump flags.
                    if self.session.keep_markers {
                        self.buffer.push(insts[i].clone());
                    }
                }
                Inst::Other { .. } => {
                    self.jumped_cond = false;
                    self.jumped_goto = false;
                    self.buffer.push(insts[i].clone());
                }
            }
        }

        // The injected return label is the last instruction, so the block
        // still being accumulated is the return-point block. Close it, and
        // hang the exit sentinel behind it when something in the function
        // actually reaches the return point.
        let closed = mem::take(&mut self.current);
        let return_bb = self.close_block(&closed);
        if self.edges.iter().any(|e| e.destination == return_label) {
            let exit = self.session.exit_name();
            self.graph.add_block(&exit, BlockKind::Exit, vec![]);
            self.edge(return_bb, exit, EdgeKind::Fallthrough);
        }

        let mut graph = self.graph;
        if let Some(entry) = graph.entry() {
            graph[entry].kind = BlockKind::Entry;
        }
        graph.apply_edges(&self.edges);
        graph
    }

    fn close_block(&mut self, name: &str) -> Block {
        let insts = mem::take(&mut self.buffer);
        trace!("closing block {} with {} instructions", name, insts.len());
        self.graph.add_block(name, BlockKind::Plain, insts)
    }

    fn edge(&mut self, source: Block, destination: String, kind: EdgeKind) {
        self.edges.push(Edge {
            source,
            destination,
            kind,
        });
    }
}

/// Return the name of the next label, if only markers precede it.
fn lookahead_label(insts: &[Inst]) -> Option<&str> {
    for inst in insts {
        match inst {
            Inst::Marker { .. } => continue,
            Inst::Label { name, .. } => return Some(name),
            _ => return None,
        }
    }
    None
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

    fn marker(text: &str) -> Inst {
        Inst::Marker {
            loc: Loc::new(1, 1),
            text: text.into(),
        }
    }

    fn op(text: &str) -> Inst {
        Inst::Other {
            loc: Loc::new(1, 1),
            text: text.into(),
        }
    }

    fn branch(target: &str) -> Inst {
        Inst::Jump {
            loc: Loc::new(1, 1),
            target: target.into(),
            conditional: true,
        }
    }

    #[test]
    fn lookahead_skips_markers() {
        let insts = vec![marker("x"), marker("y"), label("next")];
        assert_eq!(lookahead_label(&insts), Some("next"));
        let insts = vec![marker("x"), op("a"), label("next")];
        assert_eq!(lookahead_label(&insts), None);
        assert_eq!(lookahead_label(&[]), None);
    }

    #[test]
    fn label_after_jump_renames_instead_of_splitting() {
        let mut session = Session::new();
        let insts = vec![
            op("a"),
            branch("end"),
            label("cont"),
            op("b"),
            label("end"),
            label(".ret.0"),
        ];
        let graph = BlockBuilder::new(&mut session).build("f", ".ret.0", insts);
        // No fallthrough edge into "cont": the jump chose it via lookahead.
        let f = graph.lookup("f").unwrap();
        let cont = graph.lookup("cont").unwrap();
        assert_eq!(graph[f].branch_not_taken, Some(cont));
        assert_eq!(graph[f].fallthrough, None);
        assert_eq!(graph[f].branch_taken, graph.lookup("end"));
    }

    #[test]
    fn conditional_jump_spawns_synthetic_continuation() {
        let mut session = Session::new();
        let insts = vec![
            op("a"),
            branch("end"),
            op("b"),
            label("end"),
            label(".ret.0"),
        ];
        let graph = BlockBuilder::new(&mut session).build("f", ".ret.0", insts);
        let f = graph.lookup("f").unwrap();
        let cont = graph[f].branch_not_taken.expect("continuation edge");
        assert!(crate::ir::is_synthetic(&graph[cont].name));
        assert_eq!(graph[cont].insts, vec![op("b")]);
    }
}
