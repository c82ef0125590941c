//! Fixed-point FIRST and FOLLOW set computation.

use rustc_hash::FxHashSet;

use crate::grammar::{Grammar, NonterminalId, Symbol, TerminalId};

/// FIRST(X) for every non-terminal `X`, plus nullability. FIRST of a
/// terminal is trivially `{t}` and is not stored here.
pub struct FirstSets {
    nonterminal_first: Vec<FxHashSet<TerminalId>>,
    nullable: Vec<bool>,
}

impl FirstSets {
    pub fn compute<V>(grammar: &Grammar<V>) -> FirstSets {
        let n = grammar.nonterminal_count();
        let mut nonterminal_first: Vec<FxHashSet<TerminalId>> = vec![FxHashSet::default(); n];
        let mut nullable = vec![false; n];

        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let head_idx = production.head.0 as usize;
                if production.body.is_empty() {
                    if !nullable[head_idx] {
                        nullable[head_idx] = true;
                        changed = true;
                    }
                    continue;
                }

                let mut all_nullable_so_far = true;
                for symbol in &production.body {
                    match symbol {
                        Symbol::Terminal(t) => {
                            if nonterminal_first[head_idx].insert(*t) {
                                changed = true;
                            }
                            all_nullable_so_far = false;
                            break;
                        }
                        Symbol::Nonterminal(nt) => {
                            let nt_idx = nt.0 as usize;
                            let additions: Vec<TerminalId> =
                                nonterminal_first[nt_idx].iter().copied().collect();
                            for t in additions {
                                if nonterminal_first[head_idx].insert(t) {
                                    changed = true;
                                }
                            }
                            if !nullable[nt_idx] {
                                all_nullable_so_far = false;
                                break;
                            }
                        }
                    }
                }
                if all_nullable_so_far && !nullable[head_idx] {
                    nullable[head_idx] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        FirstSets {
            nonterminal_first,
            nullable,
        }
    }

    pub fn first_of_nonterminal(&self, nt: NonterminalId) -> &FxHashSet<TerminalId> {
        &self.nonterminal_first[nt.0 as usize]
    }

    pub fn is_nullable(&self, nt: NonterminalId) -> bool {
        self.nullable[nt.0 as usize]
    }

    /// FIRST of a symbol sequence, folding in `trailing` if the whole
    /// sequence can derive epsilon. This is the operation LR(1) closure
    /// uses to compute the lookahead of an added item: `FIRST(remainder
    /// . trailing)`.
    pub fn first_of_sentence(
        &self,
        symbols: &[Symbol],
        trailing: &FxHashSet<TerminalId>,
    ) -> FxHashSet<TerminalId> {
        let mut result = FxHashSet::default();
        let mut all_nullable = true;
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(t) => {
                    result.insert(*t);
                    all_nullable = false;
                    break;
                }
                Symbol::Nonterminal(nt) => {
                    result.extend(self.nonterminal_first[nt.0 as usize].iter().copied());
                    if !self.nullable[nt.0 as usize] {
                        all_nullable = false;
                        break;
                    }
                }
            }
        }
        if all_nullable {
            result.extend(trailing.iter().copied());
        }
        result
    }
}

/// FOLLOW(X) for every non-terminal `X`. Not consumed by the LALR(1) table
/// builder itself (which threads lookaheads through LR(1) items directly),
/// but kept for grammar diagnostics and grounding parity with the spec's
/// FIRST/FOLLOW component.
pub struct FollowSets {
    follow: Vec<FxHashSet<TerminalId>>,
}

impl FollowSets {
    pub fn compute<V>(grammar: &Grammar<V>, first: &FirstSets, start: NonterminalId) -> FollowSets {
        let n = grammar.nonterminal_count();
        let mut follow: Vec<FxHashSet<TerminalId>> = vec![FxHashSet::default(); n];
        follow[start.0 as usize].insert(grammar.eof);

        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let body = &production.body;
                for (i, symbol) in body.iter().enumerate() {
                    let Symbol::Nonterminal(y) = symbol else {
                        continue;
                    };
                    let remainder = &body[i + 1..];
                    let trailing = follow[production.head.0 as usize].clone();
                    let additions = first.first_of_sentence(remainder, &trailing);
                    let y_idx = y.0 as usize;
                    for t in additions {
                        if follow[y_idx].insert(t) {
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        FollowSets { follow }
    }

    pub fn follow_of(&self, nt: NonterminalId) -> &FxHashSet<TerminalId> {
        &self.follow[nt.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    #[test]
    fn first_of_terminal_production() {
        let mut g: Grammar<()> = Grammar::new();
        let a = g.add_terminal("a");
        let s = g.add_nonterminal("S");
        g.set_start(s);
        g.add_production(s, vec![Symbol::Terminal(a)], None);
        let first = FirstSets::compute(&g);
        assert!(first.first_of_nonterminal(s).contains(&a));
        assert!(!first.is_nullable(s));
    }

    #[test]
    fn nullable_production_marks_nullable() {
        let mut g: Grammar<()> = Grammar::new();
        let s = g.add_nonterminal("S");
        g.set_start(s);
        g.add_production(s, vec![], None);
        let first = FirstSets::compute(&g);
        assert!(first.is_nullable(s));
    }

    #[test]
    fn follow_of_start_contains_eof() {
        let mut g: Grammar<()> = Grammar::new();
        let a = g.add_terminal("a");
        let s = g.add_nonterminal("S");
        g.set_start(s);
        g.add_production(s, vec![Symbol::Terminal(a)], None);
        let first = FirstSets::compute(&g);
        let follow = FollowSets::compute(&g, &first, s);
        assert!(follow.follow_of(s).contains(&g.eof));
    }
}
