//! The lexer's rule table: one entry per named rule, in declaration order.
//! Declaration order both builds the combined DFA (via `cool_regex`) and
//! supplies the tie-break ordinal for rules that accept the same length.

use cool_regex::{parse, CompiledRegexSet, RegexAst};

use crate::token::TokenKind;

/// What the dispatcher should do once a rule's regex has matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Skip the matched whitespace, advancing line/column per character.
    Whitespace,
    /// `--`: consume the rest of the line as a comment, emit nothing.
    LineComment,
    /// `(*`: the callback scans for the matching, possibly nested, `*)`.
    BlockComment,
    /// `"`: the callback scans the string body, honoring escapes.
    StringLiteral,
    /// `[A-Z][a-zA-Z0-9_]*`: emits a `Type` token.
    TypeName,
    /// `[a-z][a-zA-Z0-9_]*`: emits an `Id` token, subject to keyword promotion.
    Identifier,
    /// `[0-9]+`: emits an `Int` token.
    Integer,
    /// A single fixed-lexeme rule (symbol or operator) with a known kind.
    Literal(LiteralKindTag),
}

/// `TokenKind` variants that carry no payload, usable as a `Copy` tag inside
/// `RuleKind::Literal` (`TokenKind` itself holds `String`/`i64` payloads for
/// other variants and so cannot be `Copy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKindTag {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Dot,
    Comma,
    Colon,
    Semicolon,
    At,
    Assign,
    DArrow,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Eq,
    Tilde,
}

impl LiteralKindTag {
    pub fn to_token_kind(self) -> TokenKind {
        match self {
            LiteralKindTag::LBrace => TokenKind::LBrace,
            LiteralKindTag::RBrace => TokenKind::RBrace,
            LiteralKindTag::LParen => TokenKind::LParen,
            LiteralKindTag::RParen => TokenKind::RParen,
            LiteralKindTag::Dot => TokenKind::Dot,
            LiteralKindTag::Comma => TokenKind::Comma,
            LiteralKindTag::Colon => TokenKind::Colon,
            LiteralKindTag::Semicolon => TokenKind::Semicolon,
            LiteralKindTag::At => TokenKind::At,
            LiteralKindTag::Assign => TokenKind::Assign,
            LiteralKindTag::DArrow => TokenKind::DArrow,
            LiteralKindTag::Plus => TokenKind::Plus,
            LiteralKindTag::Minus => TokenKind::Minus,
            LiteralKindTag::Star => TokenKind::Star,
            LiteralKindTag::Slash => TokenKind::Slash,
            LiteralKindTag::Lt => TokenKind::Lt,
            LiteralKindTag::Le => TokenKind::Le,
            LiteralKindTag::Eq => TokenKind::Eq,
            LiteralKindTag::Tilde => TokenKind::Tilde,
        }
    }
}

pub struct RuleTable {
    pub compiled: CompiledRegexSet,
    pub kinds: Vec<RuleKind>,
}

fn rule(pattern: &str, kind: RuleKind) -> (RegexAst, RuleKind) {
    (parse(pattern).expect("built-in lexer rule pattern must be valid"), kind)
}

impl RuleTable {
    pub fn build() -> RuleTable {
        use LiteralKindTag::*;
        use RuleKind::*;

        let entries = vec![
            rule("[ \t\n]+", Whitespace),
            rule("--", LineComment),
            rule(r"\(\*", BlockComment),
            rule("\"", StringLiteral),
            rule("[A-Z][a-zA-Z0-9_]*", TypeName),
            rule("[a-z][a-zA-Z0-9_]*", Identifier),
            rule("[0-9]+", Integer),
            rule("<-", Literal(Assign)),
            rule("<=", Literal(Le)),
            rule("=>", Literal(DArrow)),
            rule(r"\{", Literal(LBrace)),
            rule(r"\}", Literal(RBrace)),
            rule(r"\(", Literal(LParen)),
            rule(r"\)", Literal(RParen)),
            rule(r"\.", Literal(Dot)),
            rule(",", Literal(Comma)),
            rule(":", Literal(Colon)),
            rule(";", Literal(Semicolon)),
            rule("@", Literal(At)),
            rule(r"\+", Literal(Plus)),
            rule("-", Literal(Minus)),
            rule(r"\*", Literal(Star)),
            rule("/", Literal(Slash)),
            rule("<", Literal(Lt)),
            rule("=", Literal(Eq)),
            rule("~", Literal(Tilde)),
        ];

        let (patterns, kinds): (Vec<RegexAst>, Vec<RuleKind>) = entries.into_iter().unzip();
        let compiled = CompiledRegexSet::compile(&patterns);
        RuleTable { compiled, kinds }
    }
}
