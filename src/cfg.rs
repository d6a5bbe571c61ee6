// Copyright (c) 2022-2023 the cflow authors

//! The block graph produced by control-flow reconstruction.
//!
//! Blocks are owned exclusively by the [`ControlFlowGraph`] of one analysis
//! run, stored in insertion order (discovery order during the forward walk,
//! which later doubles as the default code-emission order) and keyed by
//! name. Successor fields hold [`Block`] keys rather than references, so
//! the graph can contain cycles without any ownership cycles. Edges are
//! transient construction data, resolved onto the successor fields once all
//! blocks exist.

use crate::{
    ir::Inst,
    table::{PrimaryTable, TableKey},
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, collections::HashSet, fmt};

/// A basic block.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Block(u32);

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl TableKey for Block {
    fn new(index: usize) -> Self {
        Block(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The role of a block within the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// An ordinary block.
    Plain,
    /// The function entry block.
    Entry,
    /// The terminal sentinel block behind the unified return point.
    Exit,
}

/// The kind of a control edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Control reaches the destination by running off the end of the
    /// source block.
    Fallthrough,
    /// The designated "taken" branch of a conditional jump.
    BranchTaken,
    /// The designated "not taken" branch of a conditional jump.
    BranchNotTaken,
}

/// A control edge between two blocks.
///
/// Edges exist only during construction; `ControlFlowGraph::apply_edges`
/// resolves them into the successor fields of their source blocks. The
/// source is the key of the block the edge leaves, since the builder has
/// that block in hand when it records the edge. The destination is a label
/// name, resolved against the name bindings once all blocks exist, so a
/// label defined more than once binds jumps to its latest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The source block.
    pub source: Block,
    /// The name of the destination block.
    pub destination: String,
    /// The edge kind.
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a new edge.
    pub fn new(source: Block, destination: impl Into<String>, kind: EdgeKind) -> Self {
        Edge {
            source,
            destination: destination.into(),
            kind,
        }
    }
}

/// Internal storage for a basic block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    /// The name of the block. Unique within one analysis run.
    pub name: String,
    /// The role of the block.
    pub kind: BlockKind,
    /// The instructions of the block, in source order.
    pub insts: Vec<Inst>,
    /// Whether the block is unreachable from the entry block.
    pub dead: bool,
    /// Marker instructions retained from a dead block.
    pub retained: Vec<Inst>,
    /// The successor reached by falling off the end of the block.
    pub fallthrough: Option<Block>,
    /// The successor reached when the terminating branch is taken.
    pub branch_taken: Option<Block>,
    /// The successor reached when the terminating branch is not taken.
    pub branch_not_taken: Option<Block>,
}

impl BlockData {
    fn new(name: String, kind: BlockKind, insts: Vec<Inst>) -> Self {
        BlockData {
            name,
            kind,
            insts,
            dead: false,
            retained: vec![],
            fallthrough: None,
            branch_taken: None,
            branch_not_taken: None,
        }
    }

    /// Iterate over the successors of this block, in the traversal order
    /// fallthrough, branch-taken, branch-not-taken.
    pub fn successors(&self) -> impl Iterator<Item = Block> {
        self.fallthrough
            .into_iter()
            .chain(self.branch_taken)
            .chain(self.branch_not_taken)
    }
}

/// A control flow graph.
///
/// The main container for the blocks of one analyzed function body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    blocks: PrimaryTable<Block, BlockData>,
    by_name: HashMap<String, Block>,
}

impl ControlFlowGraph {
    /// Create a new, empty control flow graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a block to the graph.
    ///
    /// If a block with the same name already exists, the name binding moves
    /// to the new block. The earlier block and its instructions stay in the
    /// table under their old key; with its incoming jumps rebound it is
    /// ordinarily unreachable and reported by the dead-code pass rather
    /// than dropped on the floor here.
    pub fn add_block(&mut self, name: impl Into<String>, kind: BlockKind, insts: Vec<Inst>) -> Block {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            trace!("rebinding block name {}", name);
        }
        let bb = self.blocks.add(BlockData::new(name.clone(), kind, insts));
        self.by_name.insert(name, bb);
        bb
    }

    /// Look up a block by name.
    pub fn lookup(&self, name: &str) -> Option<Block> {
        self.by_name.get(name).copied()
    }

    /// Return the entry block, the first block inserted.
    pub fn entry(&self) -> Option<Block> {
        self.blocks.keys().next()
    }

    /// Return the number of blocks in the graph.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check whether the graph has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over the blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        self.blocks.keys()
    }

    /// Iterate over the block data in insertion order.
    pub fn block_data(&self) -> impl Iterator<Item = &BlockData> {
        self.blocks.values()
    }

    /// Iterate mutably over the block data in insertion order.
    pub(crate) fn block_data_mut(&mut self) -> impl Iterator<Item = &mut BlockData> {
        self.blocks.values_mut()
    }

    /// Resolve recorded edges into block successor fields.
    ///
    /// Duplicate edges collapse to one, first occurrence wins. Edges whose
    /// destination name has no matching block are dropped as no-ops: the
    /// construction never produces them, and a missing lookup must not
    /// bring down the compiler.
    pub fn apply_edges(&mut self, edges: &[Edge]) {
        let mut seen = HashSet::new();
        for edge in edges {
            if !seen.insert((edge.source, edge.destination.as_str(), edge.kind)) {
                continue;
            }
            let destination = match self.lookup(&edge.destination) {
                Some(bb) => bb,
                None => {
                    trace!("dropping edge to unknown block {}", edge.destination);
                    continue;
                }
            };
            let data = &mut self.blocks[edge.source];
            let slot = match edge.kind {
                EdgeKind::Fallthrough => &mut data.fallthrough,
                EdgeKind::BranchTaken => &mut data.branch_taken,
                EdgeKind::BranchNotTaken => &mut data.branch_not_taken,
            };
            if slot.is_none() {
                *slot = Some(destination);
            }
        }
    }
}

impl std::ops::Index<Block> for ControlFlowGraph {
    type Output = BlockData;

    fn index(&self, bb: Block) -> &BlockData {
        &self.blocks[bb]
    }
}

impl std::ops::IndexMut<Block> for ControlFlowGraph {
    fn index_mut(&mut self, bb: Block) -> &mut BlockData {
        &mut self.blocks[bb]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_dedup_first_wins() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("a", BlockKind::Entry, vec![]);
        let b = cfg.add_block("b", BlockKind::Plain, vec![]);
        cfg.add_block("c", BlockKind::Plain, vec![]);
        cfg.apply_edges(&[
            Edge::new(a, "b", EdgeKind::Fallthrough),
            Edge::new(a, "b", EdgeKind::Fallthrough),
            Edge::new(a, "c", EdgeKind::Fallthrough),
            Edge::new(a, "missing", EdgeKind::BranchTaken),
        ]);
        assert_eq!(cfg[a].fallthrough, Some(b));
        assert_eq!(cfg[a].branch_taken, None);
    }

    #[test]
    fn rebinding_a_name_keeps_the_earlier_block() {
        use crate::ir::{Inst, Loc};
        let op = Inst::Other {
            loc: Loc::new(1, 1),
            text: "op1".into(),
        };
        let mut cfg = ControlFlowGraph::new();
        let first = cfg.add_block("l", BlockKind::Plain, vec![op.clone()]);
        let second = cfg.add_block("l", BlockKind::Plain, vec![]);
        assert_ne!(first, second);
        assert_eq!(cfg.lookup("l"), Some(second));
        assert_eq!(cfg[first].insts, vec![op]);
        assert_eq!(cfg.len(), 2);
    }
}
