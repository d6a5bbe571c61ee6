// Copyright (c) 2022-2023 the cflow authors

//! Per-compilation-run state shared across analyzed functions.
//!
//! The analysis rebuilds all of its maps and collections from scratch for
//! every function body, but synthetic block names and exit sentinel names
//! must stay unique across the whole compilation run. The counters backing
//! them live in a [`Session`] owned by the compiler driver and passed by
//! reference into each analyzer invocation, together with the operating
//! mode of the pass.

/// Session-wide state and configuration for the control-flow analysis.
#[derive(Debug)]
pub struct Session {
    synthetic_names: u64,
    exit_names: u64,
    /// Whether marker instructions are accumulated into blocks.
    ///
    /// This is on by default; the trimming pipeline relies on markers being
    /// present in blocks to retain them inside unreachable code. Turning it
    /// off yields a compact graph without bookkeeping instructions, for
    /// consumers that only care about the block structure.
    pub keep_markers: bool,
}

impl Session {
    /// Create a session with default configuration.
    pub fn new() -> Self {
        Session {
            synthetic_names: 0,
            exit_names: 0,
            keep_markers: true,
        }
    }

    /// Generate a fresh synthetic block name.
    ///
    /// Used for the implicit fallthrough continuation of a jump that is not
    /// immediately followed by a label. The names carry the reserved `.`
    /// prefix and are unique across all functions of the run.
    pub fn synthetic_block_name(&mut self) -> String {
        let id = self.synthetic_names;
        self.synthetic_names += 1;
        format!(".B{}", id)
    }

    /// Generate a fresh exit sentinel name, unique across the run.
    pub fn exit_name(&mut self) -> String {
        let id = self.exit_names;
        self.exit_names += 1;
        format!(".exit.{}", id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
