//! Snapshot of the compiled grammar's non-terminal alphabet, in
//! declaration order. This is the cheapest possible structural dump of
//! "table output" that stays meaningful without pulling in the full
//! ACTION/GOTO tables: a non-terminal renamed, reordered, or dropped
//! (and the augmented `S'` no longer landing last) shows up as a diff.

use cool_grammar::NonterminalId;
use cool_parser::CoolGrammar;
use insta::assert_snapshot;

#[test]
fn nonterminal_alphabet_matches_the_declared_grammar_shape() {
    let built = CoolGrammar::build().expect("COOL's grammar must be LALR(1)");
    let names: Vec<&str> = (0..built.grammar.nonterminal_count())
        .map(|i| built.grammar.nonterminal_name(NonterminalId(i as u32)))
        .collect();
    assert_snapshot!(names.join("\n"), @"program
class-list
class-def
feature-list
attribute
method
param-list
block
declaration-list
case-list
function-call
expr-list
not-empty-expr-list
expr
comp
arith
term
factor
atom
S'");
}
