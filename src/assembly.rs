// Copyright (c) 2022-2023 the cflow authors

//! Reading and writing the linear IR as text.
//!
//! The listing format is line based, one instruction per line:
//!
//! ```text
//! # comment
//! top:              label definition
//!     goto top      unconditional jump
//!     branch top    conditional jump
//!     free x        marker (bookkeeping)
//!     x = y + 1     anything else is opaque
//! ```
//!
//! Indentation and blank lines are insignificant. This is a debugging
//! surface for the `cflow-check` tool and the test suite, not a compiler
//! input format.

use crate::ir::{Inst, Loc};
use itertools::Itertools;
use std::fmt;

/// A listing could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The 1-based line the error occurred on.
    pub line: u32,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse a textual listing into an instruction sequence.
pub fn parse_listing(input: &str) -> Result<Vec<Inst>, ParseError> {
    let mut insts = vec![];
    for (i, raw) in input.lines().enumerate() {
        let line = (i + 1) as u32;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let column = (raw.len() - raw.trim_start().len() + 1) as u32;
        let loc = Loc::new(line, column);

        if let Some(name) = text.strip_suffix(':') {
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ParseError {
                    line,
                    message: format!("malformed label `{}`", text),
                });
            }
            insts.push(Inst::Label {
                loc,
                name: name.to_string(),
            });
        } else if let Some(rest) = keyword(text, "goto") {
            insts.push(jump(loc, line, rest, false)?);
        } else if let Some(rest) = keyword(text, "branch") {
            insts.push(jump(loc, line, rest, true)?);
        } else if let Some(rest) = keyword(text, "free") {
            insts.push(Inst::Marker {
                loc,
                text: rest.to_string(),
            });
        } else {
            insts.push(Inst::Other {
                loc,
                text: text.to_string(),
            });
        }
    }
    Ok(insts)
}

/// Write an instruction sequence as a textual listing.
///
/// Labels start their line, everything else is indented. The output parses
/// back to the same sequence, modulo source locations.
pub fn write_listing(insts: &[Inst]) -> String {
    insts
        .iter()
        .map(|inst| match inst {
            Inst::Label { .. } => format!("{}", inst),
            _ => format!("    {}", inst),
        })
        .join("\n")
        + "\n"
}

fn keyword<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    if rest.is_empty() {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn jump(loc: Loc, line: u32, target: &str, conditional: bool) -> Result<Inst, ParseError> {
    if target.is_empty() || target.contains(char::is_whitespace) {
        return Err(ParseError {
            line,
            message: format!("malformed jump target `{}`", target),
        });
    }
    Ok(Inst::Jump {
        loc,
        target: target.to_string(),
        conditional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_shapes() {
        let insts =
            parse_listing("top:\n    branch top\n    goto end\n    free x\n    x = 1\nend:\n")
                .unwrap();
        assert_eq!(insts.len(), 6);
        assert_eq!(insts[0].label_name(), Some("top"));
        assert!(insts[1].is_jump());
        assert!(insts[3].is_marker());
        match &insts[4] {
            Inst::Other { text, .. } => assert_eq!(text, "x = 1"),
            other => panic!("expected opaque instruction, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_jumps() {
        assert!(parse_listing("goto\n").is_err());
        assert!(parse_listing("branch a b\n").is_err());
        assert!(parse_listing("bad label:\n").is_err());
    }

    #[test]
    fn goto_prefix_is_not_a_keyword() {
        let insts = parse_listing("gotofoo = 1\n").unwrap();
        match &insts[0] {
            Inst::Other { text, .. } => assert_eq!(text, "gotofoo = 1"),
            other => panic!("expected opaque instruction, got {:?}", other),
        }
    }
}
