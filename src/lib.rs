// Copyright (c) 2022-2023 the cflow authors

//! Control-flow reconstruction and dead-code analysis for a C compiler
//! middle end.
//!
//! This library consumes the flat instruction sequence produced by
//! statement lowering, validates its labels, partitions it into basic
//! blocks connected by typed control edges, determines which blocks can
//! never be reached from the function entry, and hands a trimmed sequence
//! plus the block graph on to the backend.

pub mod analysis;
pub mod assembly;
pub mod cfg;
pub mod diag;
pub mod ir;
pub mod session;
pub mod table;

pub use crate::{
    analysis::{ControlFlowAnalyzer, LabelResolutionError},
    cfg::{Block, BlockData, BlockKind, ControlFlowGraph, Edge, EdgeKind},
    diag::{Category, Diagnostic, Diagnostics, Severity, Suppress},
    ir::{is_synthetic, Inst, Loc, SYNTHETIC_PREFIX},
    session::Session,
};
