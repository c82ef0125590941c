//! COOL's attributed grammar: an LALR(1) table built over [`cool_grammar`],
//! driven by a shift-reduce loop that turns a `cool_lexer` token stream
//! into an [`ast::Program`].

pub mod ast;
mod driver;
mod error;
mod grammar;
mod value;

pub use ast::*;
pub use error::{SyntacticError, TableError};
pub use grammar::CoolGrammar;

use cool_lexer::Token;

/// Parses a complete token stream into a [`Program`], building (and
/// caching nothing about) the LALR(1) tables fresh on every call.
///
/// Prefer [`CoolGrammar::build`] plus [`parse_with`] when parsing more than
/// one source file, so the table-construction cost is paid once.
pub fn parse(tokens: &[Token]) -> Result<(ast::Program, Vec<SyntacticError>), ParseError> {
    let grammar = CoolGrammar::build().map_err(ParseError::Table)?;
    parse_with(&grammar, tokens).map_err(ParseError::Syntax)
}

/// Parses against an already-built grammar.
pub fn parse_with(
    grammar: &CoolGrammar,
    tokens: &[Token],
) -> Result<(ast::Program, Vec<SyntacticError>), SyntacticError> {
    driver::parse(grammar, tokens)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Table(TableError),
    Syntax(SyntacticError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Table(e) => write!(f, "{e}"),
            ParseError::Syntax(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_lexer::Lexer;

    fn parse_source(source: &str) -> (ast::Program, Vec<SyntacticError>) {
        let (tokens, lex_errors) = Lexer::tokenize(source);
        assert!(lex_errors.is_empty(), "unexpected lexical errors: {lex_errors:?}");
        parse(&tokens).expect("parse should not hit a table or fatal syntax error")
    }

    #[test]
    fn grammar_builds_without_conflicts() {
        CoolGrammar::build().expect("COOL's grammar must be LALR(1)");
    }

    #[test]
    fn parses_minimal_class() {
        let (program, errors) = parse_source("class Main { main(): Object { 0 }; };");
        assert!(errors.is_empty());
        assert_eq!(program.classes.len(), 1);
        assert_eq!(program.classes[0].name, "Main");
        assert_eq!(program.classes[0].features.len(), 1);
    }

    #[test]
    fn parses_inheritance_and_attributes() {
        let (program, errors) = parse_source(
            r#"
            class A inherits IO {
                x: Int <- 0;
                get(): Int { x };
            };
            "#,
        );
        assert!(errors.is_empty());
        let class = &program.classes[0];
        assert_eq!(class.parent.as_deref(), Some("IO"));
        assert_eq!(class.features.len(), 2);
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let (program, errors) = parse_source("class Main { f(): Int { 1 + 2 * 3 }; };");
        assert!(errors.is_empty());
        let Feature::Method(method) = &program.classes[0].features[0] else {
            panic!("expected a method feature");
        };
        match &method.body {
            Expr::Binary { op: BinOp::Plus, right, .. } => {
                assert!(matches!(**right, Expr::Binary { op: BinOp::Star, .. }));
            }
            other => panic!("expected top-level `+`, got {other:?}"),
        }
    }

    #[test]
    fn parses_dispatch_forms() {
        let (program, errors) = parse_source(
            r#"
            class Main {
                f(): Object {
                    {
                        self_call(1);
                        a.plain(1, 2);
                        a@Parent.static_call();
                    }
                };
            };
            "#,
        );
        assert!(errors.is_empty());
        let Feature::Method(method) = &program.classes[0].features[0] else {
            panic!("expected a method feature");
        };
        let Expr::Block { exprs, .. } = &method.body else {
            panic!("expected a block body");
        };
        assert!(matches!(&exprs[0], Expr::MethodCall { receiver: None, ancestor: None, .. }));
        assert!(matches!(&exprs[1], Expr::MethodCall { receiver: Some(_), ancestor: None, .. }));
        assert!(matches!(&exprs[2], Expr::MethodCall { receiver: Some(_), ancestor: Some(_), .. }));
    }

    #[test]
    fn recovers_from_missing_semicolon_in_block() {
        let (_, errors) = parse_source(
            r#"
            class Main {
                f(): Object {
                    {
                        1 2 3;
                    }
                };
            };
            "#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Expected ';' instead of '2'.");
    }
}
