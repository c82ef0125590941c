//! Grammar model and LALR(1) parser-table construction.
//!
//! A [`grammar::Grammar`] owns terminals, non-terminals, and attributed
//! productions in insertion order. [`lr::build_lalr`] compiles it into
//! ACTION/GOTO [`lr::Tables`] by building the LR(1) automaton and merging
//! states that share a kernel core, propagating lookaheads to a fixpoint.

pub mod grammar;
pub mod lr;
pub mod sets;

pub use grammar::{
    Grammar, NonterminalId, Production, ProductionId, ReductionFrame, ReductionRule, Sentence,
    Symbol, TerminalId,
};
pub use lr::{build_lalr, Action, Center, Conflict, ConflictKind, Item, Tables};
pub use sets::{FirstSets, FollowSets};
