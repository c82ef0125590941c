//! A small regex engine: pattern parsing, Thompson NFA construction, subset
//! construction into a DFA, and Hopcroft-style minimization.
//!
//! This crate backs the lexer's rule table: each lexical rule is compiled
//! once into a [`dfa::CompiledRegexSet`], and the lexer repeatedly asks it
//! for the longest match at the current input position.

pub mod ast;
pub mod dfa;
pub mod nfa;

pub use ast::{parse, RegexAst, RegexParseError};
pub use dfa::{CompiledRegexSet, Match};
