//! The shift-reduce execution loop: walks a token stream against the
//! compiled LALR(1) tables, invoking each production's reduction rule to
//! build the AST bottom-up.
//!
//! The stack is kept as three parallel vectors rather than one interleaved
//! one (`[state0, symbol1, value1, state1, ...]` in the grammar's own
//! terms) -- same shape, easier to index from Rust.

use cool_grammar::{Action, Symbol};
use cool_lexer::Token;
use tracing::trace;

use crate::ast::Program;
use crate::error::SyntacticError;
use crate::grammar::CoolGrammar;
use crate::value::Value;

struct Stack {
    states: Vec<usize>,
    symbols: Vec<Symbol>,
    values: Vec<Value>,
}

impl Stack {
    fn new() -> Stack {
        Stack {
            states: vec![0],
            symbols: Vec::new(),
            values: Vec::new(),
        }
    }

    fn state(&self) -> usize {
        *self.states.last().expect("state stack is never empty")
    }

    fn shift(&mut self, next_state: usize, symbol: Symbol, value: Value) {
        self.states.push(next_state);
        self.symbols.push(symbol);
        self.values.push(value);
    }

    /// Pop `n` symbol/value pairs (in body order) and truncate the
    /// accompanying state stack.
    fn pop(&mut self, n: usize) -> (Vec<Symbol>, Vec<Value>) {
        let split = self.symbols.len() - n;
        let symbols = self.symbols.split_off(split);
        let values = self.values.split_off(split);
        self.states.truncate(self.states.len() - n);
        (symbols, values)
    }
}

/// Parses a full token stream (must end in `TokenKind::Eof`, as produced by
/// `cool_lexer::Lexer::tokenize`) into a [`Program`].
///
/// Local error productions recover silently and contribute a
/// [`SyntacticError`] to the returned list; a lookahead with no ACTION
/// entry at all (no error production covers it) is unrecoverable and ends
/// the parse early.
pub fn parse(grammar: &CoolGrammar, tokens: &[Token]) -> Result<(Program, Vec<SyntacticError>), SyntacticError> {
    let mut stack = Stack::new();
    let mut errors = Vec::new();
    let mut pos = 0usize;

    loop {
        let lookahead = &tokens[pos];
        let terminal = *grammar
            .terminal_by_name
            .get(lookahead.kind.terminal_name())
            .unwrap_or_else(|| panic!("unrecognized terminal name {:?}", lookahead.kind.terminal_name()));

        let state = stack.state();
        match grammar.tables.action(state, terminal) {
            Some(Action::Shift(next_state)) => {
                trace!(state, next_state, token = %lookahead, "shift");
                stack.shift(next_state, Symbol::Terminal(terminal), Value::Token(lookahead.clone()));
                pos += 1;
            }
            Some(Action::Reduce(production_id)) => {
                let production = grammar.grammar.production(production_id);
                let body_len = production.body.len();
                let (symbols, values) = stack.pop(body_len);

                if production.is_error_production(grammar.grammar.error) {
                    let error_pos = production
                        .body
                        .iter()
                        .position(|s| matches!(s, Symbol::Terminal(t) if *t == grammar.grammar.error))
                        .expect("is_error_production guarantees an ERROR symbol in the body");
                    if let Value::Token(offending) = &values[error_pos] {
                        errors.push(SyntacticError::new(
                            offending.line,
                            offending.column,
                            format!("Expected ';' instead of '{}'.", offending.lexeme),
                        ));
                    }
                } else {
                    debug_assert_eq!(symbols, production.body, "popped symbols must match production body");
                }

                let rule = production
                    .rule
                    .as_ref()
                    .expect("every non-augmented production carries a reduction rule");
                let mut frame = cool_grammar::ReductionFrame::new(values);
                let result = rule(&mut frame);

                let exposed_state = stack.state();
                let goto_state = grammar
                    .tables
                    .goto(exposed_state, production.head)
                    .unwrap_or_else(|| panic!("missing GOTO({exposed_state}, {:?})", production.head));
                trace!(exposed_state, goto_state, head = ?production.head, "reduce");
                stack.shift(goto_state, Symbol::Nonterminal(production.head), result);
            }
            Some(Action::Accept) => {
                let value = stack.values.pop().expect("accept requires a value on the stack");
                return Ok((value.program(), errors));
            }
            None => {
                return Err(SyntacticError::new(
                    lookahead.line,
                    lookahead.column,
                    format!("unexpected token '{}'", lookahead.lexeme),
                ));
            }
        }
    }
}
