//! Subset construction (NFA -> DFA) and Hopcroft-style minimization.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::nfa::{Nfa, StateId};

pub type DfaStateId = usize;

/// A disjoint, sorted partition of the character alphabet used by a
/// particular NFA. Built once from every range boundary that appears in the
/// NFA's transitions, so that subset construction only ever needs to
/// consider one representative character per interval.
#[derive(Debug, Clone)]
pub struct Alphabet {
    /// Sorted, non-overlapping, contiguous-where-possible intervals.
    intervals: Vec<(char, char)>,
}

impl Alphabet {
    fn from_nfa(nfa: &Nfa) -> Alphabet {
        let mut boundaries: BTreeSet<u32> = BTreeSet::new();
        for state in &nfa.states {
            for (range, _) in &state.transitions {
                boundaries.insert(range.lo as u32);
                boundaries.insert(range.hi as u32 + 1);
            }
        }
        if boundaries.is_empty() {
            return Alphabet { intervals: vec![] };
        }
        let sorted: Vec<u32> = boundaries.into_iter().collect();
        let mut intervals = Vec::new();
        for w in sorted.windows(2) {
            let lo = w[0];
            let hi = w[1] - 1;
            if let (Some(lo_c), Some(hi_c)) = (char::from_u32(lo), char::from_u32(hi)) {
                intervals.push((lo_c, hi_c));
            }
        }
        Alphabet { intervals }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Find the interval index containing `c`, if any.
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.intervals
            .binary_search_by(|&(lo, hi)| {
                if c < lo {
                    std::cmp::Ordering::Greater
                } else if c > hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }

    fn representative(&self, idx: usize) -> char {
        self.intervals[idx].0
    }
}

/// A deterministic finite automaton recognizing the union of every rule's
/// pattern, with each accepting state tagged by the lowest-ordinal rule
/// that fires there (declaration order breaks ties, per the lexer spec).
pub struct Dfa {
    pub alphabet: Alphabet,
    /// transitions[state][interval] = Some(next_state)
    transitions: Vec<Vec<Option<DfaStateId>>>,
    /// accept[state] = Some(rule_ordinal) if state is accepting.
    accept: Vec<Option<usize>>,
    pub start: DfaStateId,
}

impl Dfa {
    /// Subset construction directly from an NFA.
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        let alphabet = Alphabet::from_nfa(nfa);
        let mut accept_of: FxHashMap<StateId, usize> = FxHashMap::default();
        for &(state, ordinal) in &nfa.accepts {
            accept_of
                .entry(state)
                .and_modify(|o| *o = (*o).min(ordinal))
                .or_insert(ordinal);
        }

        let start_set = nfa.epsilon_closure(&[nfa.start]);
        let mut set_to_id: FxHashMap<Vec<StateId>, DfaStateId> = FxHashMap::default();
        let mut transitions: Vec<Vec<Option<DfaStateId>>> = Vec::new();
        let mut accept: Vec<Option<usize>> = Vec::new();
        let mut worklist = vec![start_set.clone()];
        set_to_id.insert(start_set.clone(), 0);
        transitions.push(vec![None; alphabet.len()]);
        accept.push(tag_of(&start_set, &accept_of));

        while let Some(set) = worklist.pop() {
            let from_id = set_to_id[&set];
            for idx in 0..alphabet.len() {
                let rep = alphabet.representative(idx);
                let mut moved = Vec::new();
                for &s in &set {
                    for (range, target) in &nfa.states[s].transitions {
                        if range.contains(rep) {
                            moved.push(*target);
                        }
                    }
                }
                if moved.is_empty() {
                    continue;
                }
                let closure = nfa.epsilon_closure(&moved);
                let to_id = *set_to_id.entry(closure.clone()).or_insert_with(|| {
                    let id = transitions.len();
                    transitions.push(vec![None; alphabet.len()]);
                    accept.push(tag_of(&closure, &accept_of));
                    worklist.push(closure.clone());
                    id
                });
                transitions[from_id][idx] = Some(to_id);
            }
        }

        Dfa {
            alphabet,
            transitions,
            accept,
            start: 0,
        }
    }

    pub fn is_accepting(&self, state: DfaStateId) -> Option<usize> {
        self.accept[state]
    }

    pub fn step(&self, state: DfaStateId, c: char) -> Option<DfaStateId> {
        let idx = self.alphabet.index_of(c)?;
        self.transitions[state][idx]
    }

    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// Minimize via partition refinement (Hopcroft-style): states start
    /// grouped by `(is_accepting, rule_ordinal)` and are split apart
    /// whenever two states in the same group transition to different
    /// groups on some alphabet interval. Iterates to a fixpoint.
    pub fn minimize(&self) -> Dfa {
        let n = self.state_count();
        let mut group_of: Vec<usize> = vec![0; n];
        let mut groups: Vec<Vec<DfaStateId>> = vec![];
        {
            let mut by_tag: FxHashMap<Option<usize>, Vec<DfaStateId>> = FxHashMap::default();
            for s in 0..n {
                by_tag.entry(self.accept[s]).or_default().push(s);
            }
            for (_, members) in by_tag {
                let gid = groups.len();
                for &m in &members {
                    group_of[m] = gid;
                }
                groups.push(members);
            }
        }

        loop {
            let mut changed = false;
            let mut new_groups: Vec<Vec<DfaStateId>> = Vec::new();
            let mut new_group_of: Vec<usize> = vec![0; n];

            for members in &groups {
                let mut signature_to_bucket: FxHashMap<Vec<Option<usize>>, Vec<DfaStateId>> =
                    FxHashMap::default();
                for &s in members {
                    let sig: Vec<Option<usize>> = (0..self.alphabet.len())
                        .map(|idx| self.transitions[s][idx].map(|t| group_of[t]))
                        .collect();
                    signature_to_bucket.entry(sig).or_default().push(s);
                }
                if signature_to_bucket.len() > 1 {
                    changed = true;
                }
                for (_, bucket) in signature_to_bucket {
                    let gid = new_groups.len();
                    for &m in &bucket {
                        new_group_of[m] = gid;
                    }
                    new_groups.push(bucket);
                }
            }

            groups = new_groups;
            group_of = new_group_of;
            if !changed {
                break;
            }
        }

        let mut transitions = vec![vec![None; self.alphabet.len()]; groups.len()];
        let mut accept = vec![None; groups.len()];
        for (gid, members) in groups.iter().enumerate() {
            let rep = members[0];
            accept[gid] = self.accept[rep];
            for idx in 0..self.alphabet.len() {
                transitions[gid][idx] = self.transitions[rep][idx].map(|t| group_of[t]);
            }
        }
        let start = group_of[self.start];

        Dfa {
            alphabet: self.alphabet.clone(),
            transitions,
            accept,
            start,
        }
    }
}

fn tag_of(set: &[StateId], accept_of: &FxHashMap<StateId, usize>) -> Option<usize> {
    set.iter().filter_map(|s| accept_of.get(s).copied()).min()
}

/// A compiled set of regexes, ready to greedily match the longest prefix of
/// an input at a given starting position, breaking ties by declaration order.
pub struct CompiledRegexSet {
    dfa: Dfa,
}

/// The result of a successful match: how many characters were consumed and
/// which rule (by declaration order) fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub len_chars: usize,
    pub rule_ordinal: usize,
}

impl CompiledRegexSet {
    pub fn compile(patterns: &[crate::ast::RegexAst]) -> CompiledRegexSet {
        let nfa = Nfa::build(patterns);
        let dfa = Dfa::from_nfa(&nfa).minimize();
        CompiledRegexSet { dfa }
    }

    /// Greedy longest match starting at the front of `input`. Among
    /// multiple rules accepting at the longest matched length, the one
    /// with the smallest declaration ordinal wins.
    pub fn longest_match(&self, input: &str) -> Option<Match> {
        let mut state = self.dfa.start;
        let mut best: Option<Match> = None;
        let mut consumed = 0;
        if let Some(ordinal) = self.dfa.is_accepting(state) {
            best = Some(Match {
                len_chars: 0,
                rule_ordinal: ordinal,
            });
        }
        for c in input.chars() {
            match self.dfa.step(state, c) {
                Some(next) => {
                    state = next;
                    consumed += 1;
                    if let Some(ordinal) = self.dfa.is_accepting(state) {
                        best = Some(Match {
                            len_chars: consumed,
                            rule_ordinal: ordinal,
                        });
                    }
                }
                None => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse;
    use crate::nfa::Nfa;

    fn build_dfa(patterns: &[&str]) -> Dfa {
        let asts: Vec<_> = patterns.iter().map(|p| parse(p).unwrap()).collect();
        let nfa = Nfa::build(&asts);
        Dfa::from_nfa(&nfa)
    }

    #[test]
    fn recognizes_simple_literal() {
        let dfa = build_dfa(&["abc"]);
        let mut state = dfa.start;
        for c in "abc".chars() {
            state = dfa.step(state, c).expect("transition should exist");
        }
        assert_eq!(dfa.is_accepting(state), Some(0));
    }

    #[test]
    fn first_declared_rule_wins_ties() {
        // Both rules match "ab"; rule 0 ("ab") should win over rule 1 ("a*b").
        let dfa = build_dfa(&["ab", "a*b"]);
        let mut state = dfa.start;
        state = dfa.step(state, 'a').unwrap();
        state = dfa.step(state, 'b').unwrap();
        assert_eq!(dfa.is_accepting(state), Some(0));
    }

    #[test]
    fn minimized_dfa_still_recognizes() {
        let dfa = build_dfa(&["a+"]).minimize();
        let mut state = dfa.start;
        for c in "aaaa".chars() {
            state = dfa.step(state, c).expect("transition should exist");
        }
        assert_eq!(dfa.is_accepting(state), Some(0));
    }
}
