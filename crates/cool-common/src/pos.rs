use serde::Serialize;

/// A 1-based (line, column) pair, tracked incrementally by the lexer.
///
/// Tabs advance the column by 4; other whitespace and ordinary characters
/// advance it by 1; newlines reset the column to 1 and increment the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn start() -> Self {
        Position { line: 1, column: 1 }
    }

    /// Advance past a single character, applying COOL's column rules.
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => self.column += 4,
            _ => self.column += 1,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_advances_by_four() {
        let mut pos = Position::start();
        pos.advance('\t');
        assert_eq!(pos, Position { line: 1, column: 5 });
    }

    #[test]
    fn newline_resets_column() {
        let mut pos = Position { line: 3, column: 9 };
        pos.advance('\n');
        assert_eq!(pos, Position { line: 4, column: 1 });
    }

    #[test]
    fn ordinary_char_advances_by_one() {
        let mut pos = Position::start();
        pos.advance('x');
        assert_eq!(pos, Position { line: 1, column: 2 });
    }
}
