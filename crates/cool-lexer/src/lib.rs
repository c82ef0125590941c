//! Regex-table-driven lexer for COOL.
//!
//! A single compiled [`cool_regex::CompiledRegexSet`] recognizes the
//! longest match among every rule at the current position. Most rules emit
//! a token directly; a handful ("string" and the two comment openers)
//! match only their opening delimiter and hand off to a dedicated scan
//! that consumes the (non-regular) body by hand, mirroring the
//! named-rule-plus-callback protocol this lexer is built from.

pub mod error;
pub mod keywords;
pub mod rules;
pub mod token;

use cool_common::{Position, Span};
pub use error::LexError;
pub use token::{Token, TokenKind};

use rules::{RuleKind, RuleTable};

pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    position: Position,
    table: RuleTable,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Lexer<'src> {
        Lexer {
            source,
            pos: 0,
            position: Position::start(),
            table: RuleTable::build(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the full source, returning the token stream (terminated by
    /// an `Eof` token) and the accumulated lexical diagnostics.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
        let mut lexer = Lexer::new(source);
        lexer.run();
        (lexer.tokens, lexer.errors)
    }

    fn run(&mut self) {
        while self.pos < self.source.len() {
            let slice = &self.source[self.pos..];
            match self.table.compiled.longest_match(slice) {
                Some(m) if m.len_chars > 0 => {
                    let matched: String = slice.chars().take(m.len_chars).collect();
                    let kind = self.table.kinds[m.rule_ordinal];
                    self.dispatch(kind, matched);
                }
                _ => self.lexical_error(),
            }
        }
        self.tokens.push(Token::new(
            "",
            TokenKind::Eof,
            self.position.line,
            self.position.column,
            Span::new(self.pos as u32, self.pos as u32),
        ));
    }

    fn advance_one(&mut self, c: char) {
        self.pos += c.len_utf8();
        self.position.advance(c);
    }

    fn advance_by(&mut self, s: &str) {
        for c in s.chars() {
            self.advance_one(c);
        }
    }

    fn dispatch(&mut self, kind: RuleKind, matched: String) {
        let start_line = self.position.line;
        let start_col = self.position.column;
        let start_byte = self.pos;
        self.advance_by(&matched);
        let span = Span::new(start_byte as u32, self.pos as u32);

        match kind {
            RuleKind::Whitespace => {}
            RuleKind::LineComment => self.consume_line_comment(),
            RuleKind::BlockComment => self.consume_block_comment(start_line, start_col, start_byte),
            RuleKind::StringLiteral => self.consume_string(start_line, start_col, start_byte),
            RuleKind::TypeName => {
                self.tokens.push(Token::new(
                    matched.clone(),
                    TokenKind::Type(matched),
                    start_line,
                    start_col,
                    span,
                ));
            }
            RuleKind::Identifier => {
                let tok_kind =
                    keywords::promote(&matched).unwrap_or_else(|| TokenKind::Id(matched.clone()));
                self.tokens
                    .push(Token::new(matched, tok_kind, start_line, start_col, span));
            }
            RuleKind::Integer => {
                // The grammar guarantees only ASCII digits reach here; a
                // value wider than i64 is clamped rather than panicking.
                let value: i64 = matched.parse().unwrap_or(i64::MAX);
                self.tokens
                    .push(Token::new(matched, TokenKind::Int(value), start_line, start_col, span));
            }
            RuleKind::Literal(tag) => {
                self.tokens
                    .push(Token::new(matched, tag.to_token_kind(), start_line, start_col, span));
            }
        }
    }

    /// `--`: everything up to (but not including) the next newline is
    /// discarded without producing a token.
    fn consume_line_comment(&mut self) {
        let rest = &self.source[self.pos..];
        let mut consumed = String::new();
        for c in rest.chars() {
            if c == '\n' {
                break;
            }
            consumed.push(c);
        }
        self.advance_by(&consumed);
    }

    /// `(* ... *)`: nests, so a naked `*)` only closes the innermost level.
    fn consume_block_comment(&mut self, start_line: u32, start_col: u32, _start_byte: usize) {
        let mut depth = 1usize;
        loop {
            let rest = &self.source[self.pos..];
            let mut chars = rest.chars();
            let Some(c) = chars.next() else {
                self.errors
                    .push(LexError::new(start_line, start_col, "EOF in comment"));
                return;
            };
            if c == '*' && chars.clone().next() == Some(')') {
                self.advance_by("*)");
                depth -= 1;
                if depth == 0 {
                    return;
                }
                continue;
            }
            if c == '(' && chars.clone().next() == Some('*') {
                self.advance_by("(*");
                depth += 1;
                continue;
            }
            self.advance_one(c);
        }
    }

    /// `"..."`: honors `\b \f \t \n`, the `\\\n` line continuation, and
    /// reports the three string-specific lexical errors bit-exactly.
    fn consume_string(&mut self, start_line: u32, start_col: u32, start_byte: usize) {
        let mut value = String::new();
        loop {
            let rest = &self.source[self.pos..];
            let Some(c) = rest.chars().next() else {
                self.errors
                    .push(LexError::new(start_line, start_col, "EOF in string constant"));
                return;
            };

            match c {
                '"' => {
                    self.advance_one(c);
                    let span = Span::new(start_byte as u32, self.pos as u32);
                    self.tokens.push(Token::new(
                        value.clone(),
                        TokenKind::Str(value),
                        start_line,
                        start_col,
                        span,
                    ));
                    return;
                }
                '\0' => {
                    self.errors.push(LexError::new(
                        start_line,
                        start_col,
                        "String contains null character",
                    ));
                    self.advance_one(c);
                    return;
                }
                '\n' => {
                    self.errors.push(LexError::new(
                        start_line,
                        start_col,
                        "Unterminated string constant",
                    ));
                    return;
                }
                '\\' => {
                    self.advance_one(c);
                    let rest2 = &self.source[self.pos..];
                    let Some(escaped) = rest2.chars().next() else {
                        self.errors
                            .push(LexError::new(start_line, start_col, "EOF in string constant"));
                        return;
                    };
                    self.advance_one(escaped);
                    match escaped {
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        't' => value.push('\t'),
                        'n' => value.push('\n'),
                        '\n' => {}
                        other => value.push(other),
                    }
                }
                other => {
                    self.advance_one(other);
                    value.push(other);
                }
            }
        }
    }

    fn lexical_error(&mut self) {
        let rest = &self.source[self.pos..];
        let c = rest.chars().next().expect("loop guard ensures more input remains");
        self.errors
            .push(LexError::new(self.position.line, self.position.column, format!("ERROR \"{}\"", c)));
        self.advance_one(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::tokenize(source);
        assert!(errors.is_empty(), "unexpected lexical errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("class Main inherits IO"),
            vec![
                TokenKind::Class,
                TokenKind::Type("Main".into()),
                TokenKind::Inherits,
                TokenKind::Type("IO".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_symbols_and_operators_by_longest_match() {
        assert_eq!(
            kinds("<- <= < = ~"),
            vec![
                TokenKind::Assign,
                TokenKind::Le,
                TokenKind::Lt,
                TokenKind::Eq,
                TokenKind::Tilde,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_integer_and_string_literal() {
        assert_eq!(
            kinds(r#"42 "hi\nthere""#),
            vec![
                TokenKind::Int(42),
                TokenKind::Str("hi\nthere".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_nested_block_comments() {
        assert_eq!(
            kinds("-- a comment\n(* nested (* comment *) still going *) 7"),
            vec![TokenKind::Int(7), TokenKind::Eof]
        );
    }

    #[test]
    fn tab_advances_column_by_four_inside_source() {
        let (tokens, _) = Lexer::tokenize("\tx");
        // tab: (1,1) -> (1,5); then 'x' identifier starts at column 5.
        assert_eq!(tokens[0].column, 5);
    }

    #[test]
    fn unterminated_string_reports_diagnostic() {
        let (_, errors) = Lexer::tokenize("\"abc\ndef\"");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unterminated string constant"));
    }

    #[test]
    fn eof_inside_string_reports_diagnostic() {
        let (_, errors) = Lexer::tokenize("\"abc");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("EOF in string constant"));
    }

    #[test]
    fn eof_inside_block_comment_reports_diagnostic() {
        let (_, errors) = Lexer::tokenize("(* never closed");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("EOF in comment"));
    }

    #[test]
    fn unknown_character_reports_lexical_error_and_recovers() {
        let (tokens, errors) = Lexer::tokenize("1 $ 2");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            tokens.iter().map(|t| &t.kind).collect::<Vec<_>>(),
            vec![&TokenKind::Int(1), &TokenKind::Int(2), &TokenKind::Eof]
        );
    }
}
