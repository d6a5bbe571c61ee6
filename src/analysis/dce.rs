// Copyright (c) 2022-2023 the cflow authors

//! Reachability checking and dead-code stripping.
//!
//! A depth-first traversal from the entry block marks every block it never
//! visits as dead. Dead blocks are then reduced to their side-effect-free
//! bookkeeping markers, with one "unreachable code" warning per block,
//! positioned at the first substantive instruction.

use crate::{
    cfg::{Block, ControlFlowGraph},
    diag::{Category, Diagnostics},
    ir::{is_synthetic, Inst},
};
use log::{debug, trace};
use std::collections::HashSet;

/// Mark every block unreachable from the entry block as dead.
///
/// The traversal follows fallthrough, branch-taken and branch-not-taken
/// successors in that order, guarding against revisits since loops make the
/// graph cyclic.
pub fn mark_unreachable(graph: &mut ControlFlowGraph) {
    let mut visited: HashSet<Block> = HashSet::new();
    let mut todo: Vec<Block> = vec![];
    if let Some(entry) = graph.entry() {
        visited.insert(entry);
        todo.push(entry);
    }
    while let Some(bb) = todo.pop() {
        // Push successors in reverse so the fallthrough edge is explored
        // first.
        let succs: Vec<_> = graph[bb].successors().collect();
        for succ in succs.into_iter().rev() {
            if visited.insert(succ) {
                todo.push(succ);
            }
        }
    }
    for bb in graph.blocks().collect::<Vec<_>>() {
        if !visited.contains(&bb) {
            trace!("block {} ({}) is unreachable", bb, graph[bb].name);
            graph[bb].dead = true;
        }
    }
}

/// Strip dead blocks down to their markers and assemble the trimmed
/// instruction sequence.
///
/// For every dead block, the marker instructions move into the block's
/// retained list and one dead-code warning is emitted at the first
/// substantive instruction: the first non-marker whose associated label or
/// jump target, if any, is not compiler-generated. The trimmed sequence is
/// the concatenation, in block-insertion order, of the retained markers of
/// dead blocks and the full instruction lists of live ones.
pub fn strip_dead(graph: &mut ControlFlowGraph, diags: &mut Diagnostics) -> Vec<Inst> {
    let mut trimmed = vec![];
    for data in graph.block_data_mut() {
        if !data.dead {
            trimmed.extend(data.insts.iter().cloned());
            continue;
        }
        debug!("stripping unreachable block {}", data.name);
        let mut warned = false;
        let mut retained = vec![];
        for inst in &data.insts {
            if inst.is_marker() {
                retained.push(inst.clone());
                continue;
            }
            if !warned && inst.label_name().map_or(true, |name| !is_synthetic(name)) {
                warned = true;
                diags.warn(inst.loc(), Category::DeadCode, "Code is unreachable");
            }
        }
        data.retained = retained;
        trimmed.extend(data.retained.iter().cloned());
    }
    trimmed
}

/// Convenience wrapper running reachability and stripping back to back.
pub fn eliminate_dead_code(graph: &mut ControlFlowGraph, diags: &mut Diagnostics) -> Vec<Inst> {
    mark_unreachable(graph);
    strip_dead(graph, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{BlockKind, Edge, EdgeKind};
    use crate::ir::Loc;

    fn marker(text: &str) -> Inst {
        Inst::Marker {
            loc: Loc::new(1, 1),
            text: text.into(),
        }
    }

    fn op(text: &str) -> Inst {
        Inst::Other {
            loc: Loc::new(4, 2),
            text: text.into(),
        }
    }

    #[test]
    fn cycles_terminate() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("a", BlockKind::Entry, vec![]);
        let b = cfg.add_block("b", BlockKind::Plain, vec![]);
        cfg.apply_edges(&[
            Edge::new(a, "b", EdgeKind::Fallthrough),
            Edge::new(b, "a", EdgeKind::Fallthrough),
        ]);
        mark_unreachable(&mut cfg);
        assert!(cfg.block_data().all(|data| !data.dead));
    }

    #[test]
    fn dead_block_keeps_markers_and_warns_once() {
        let mut cfg = ControlFlowGraph::new();
        cfg.add_block("a", BlockKind::Entry, vec![op("live")]);
        cfg.add_block(
            "b",
            BlockKind::Plain,
            vec![marker("x"), op("dead1"), op("dead2"), marker("y")],
        );
        let mut diags = Diagnostics::new();
        let trimmed = eliminate_dead_code(&mut cfg, &mut diags);
        assert_eq!(trimmed, vec![op("live"), marker("x"), marker("y")]);
        let warnings: Vec<_> = diags
            .iter()
            .filter(|d| d.category == Category::DeadCode)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].loc, Loc::new(4, 2));
    }

    #[test]
    fn synthetic_labels_do_not_position_warnings() {
        let mut cfg = ControlFlowGraph::new();
        cfg.add_block("a", BlockKind::Entry, vec![]);
        cfg.add_block(
            "b",
            BlockKind::Plain,
            vec![Inst::Label {
                loc: Loc::new(9, 1),
                name: ".B7".into(),
            }],
        );
        let mut diags = Diagnostics::new();
        eliminate_dead_code(&mut cfg, &mut diags);
        assert!(diags.is_empty());
    }
}
