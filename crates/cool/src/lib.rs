//! Top-level library crate: wires `cool-lexer` -> `cool-parser` ->
//! `cool-sema` -> `cool-eval` into two entry points, `compile` and `run`.
//! No CLI and no binary target live here; callers (and this crate's own
//! integration tests) drive everything as a library.

use std::fmt;

use cool_eval::{CoolIo, Value};
use cool_lexer::{LexError, Lexer};
use cool_parser::{ParseError, Program, SyntacticError};
use cool_sema::{Context, Scope, SemanticError};

/// Everything a `compile` produced, whether or not it's error-free.
pub struct CompileOutcome {
    pub program: Program,
    pub ctx: Context,
    pub scope: Scope,
    pub lex_errors: Vec<LexError>,
    pub syntax_errors: Vec<SyntacticError>,
    pub semantic_errors: Vec<SemanticError>,
}

impl CompileOutcome {
    pub fn is_ok(&self) -> bool {
        self.lex_errors.is_empty() && self.syntax_errors.is_empty() && self.semantic_errors.is_empty()
    }
}

/// Lexes, parses, and runs the full semantic pipeline over `source`.
/// Lexical, syntactic, and semantic diagnostics accumulate on the
/// returned `CompileOutcome` rather than aborting; only a fatal parser
/// condition (a grammar conflict, or a syntax error outside any error
/// production) short-circuits as `Err`.
pub fn compile(source: &str) -> Result<CompileOutcome, ParseError> {
    let (tokens, lex_errors) = Lexer::tokenize(source);
    let (mut program, syntax_errors) = cool_parser::parse(&tokens)?;
    let (ctx, scope, semantic_errors) = cool_sema::analyze(&mut program);
    Ok(CompileOutcome {
        program,
        ctx,
        scope,
        lex_errors,
        syntax_errors,
        semantic_errors,
    })
}

#[derive(Debug)]
pub enum RunError {
    Parse(ParseError),
    Diagnostics {
        lex: Vec<LexError>,
        syntax: Vec<SyntacticError>,
        semantic: Vec<SemanticError>,
    },
    Execution(cool_eval::ExecutionError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Parse(e) => write!(f, "{e}"),
            RunError::Diagnostics { lex, syntax, semantic } => {
                for e in lex {
                    writeln!(f, "{e}")?;
                }
                for e in syntax {
                    writeln!(f, "{e}")?;
                }
                for e in semantic {
                    writeln!(f, "{e}")?;
                }
                Ok(())
            }
            RunError::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Compiles `source` and, if it compiled cleanly, runs `Main.main`
/// against `io`. Any diagnostic (lexical, syntactic, or semantic) is
/// reported instead of attempting to evaluate a program that didn't fully
/// type-check.
pub fn run(source: &str, io: &mut dyn CoolIo) -> Result<Value, RunError> {
    let outcome = compile(source).map_err(RunError::Parse)?;
    if !outcome.is_ok() {
        return Err(RunError::Diagnostics {
            lex: outcome.lex_errors,
            syntax: outcome.syntax_errors,
            semantic: outcome.semantic_errors,
        });
    }
    cool_eval::run(&outcome.ctx, io).map_err(RunError::Execution)
}
