//! Syntactic diagnostics and the table-conflict report.

use std::fmt;

use cool_grammar::{Conflict, ConflictKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SyntacticError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SyntacticError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> SyntacticError {
        SyntacticError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntacticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) - SyntacticError: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntacticError {}

/// Raised when the grammar itself failed to build a conflict-free LALR(1)
/// table; this can only happen once, at crate-init time, so callers treat
/// it as effectively fatal rather than a per-parse diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct TableError {
    pub conflicts: Vec<Conflict>,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "grammar is not LALR(1): {} conflict(s)", self.conflicts.len())?;
        for c in &self.conflicts {
            let kind = match c.kind {
                ConflictKind::ShiftReduce => "shift/reduce",
                ConflictKind::ReduceReduce => "reduce/reduce",
            };
            writeln!(f, "  state {}, symbol {:?}: {}", c.state, c.symbol, kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for TableError {}
