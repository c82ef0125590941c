//! Lexical diagnostics.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl LexError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> LexError {
        LexError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - LexicographicError: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexError {}
