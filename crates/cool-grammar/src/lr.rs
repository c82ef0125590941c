//! LR(1) items, closure/goto, and LALR(1) automaton and table construction.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::grammar::{Grammar, NonterminalId, ProductionId, Symbol, TerminalId};
use crate::sets::FirstSets;

/// An item's production/dot-position pair, with lookaheads stripped. Used
/// as the merge key both within closure (items sharing a center union their
/// lookaheads) and across LALR states (states sharing a kernel core merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Center {
    pub production: ProductionId,
    pub dot: usize,
}

/// A center with its associated set of lookahead terminals. Equality is
/// structural over all three fields (production, dot, lookaheads).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub center: Center,
    pub lookaheads: BTreeSet<TerminalId>,
}

impl Item {
    fn symbol_at_dot<V>(&self, grammar: &Grammar<V>) -> Option<Symbol> {
        let production = grammar.production(self.center.production);
        production.body.get(self.center.dot).copied()
    }

    pub fn can_reduce<V>(&self, grammar: &Grammar<V>) -> bool {
        let production = grammar.production(self.center.production);
        self.center.dot == production.body.len()
    }
}

/// `closure(I)`: for every item with a non-terminal after the dot, add one
/// item per production of that non-terminal at dot 0, with lookaheads
/// `FIRST(remainder . carried-lookahead)`. Items sharing a center are
/// compressed by unioning lookaheads; newly grown lookahead sets re-trigger
/// their own expansion until a fixpoint.
pub fn closure<V>(grammar: &Grammar<V>, first: &FirstSets, seed: Vec<Item>) -> Vec<Item> {
    let mut table: FxHashMap<Center, BTreeSet<TerminalId>> = FxHashMap::default();
    for item in seed {
        table.entry(item.center).or_default().extend(item.lookaheads);
    }
    let mut queue: Vec<Center> = table.keys().copied().collect();

    while let Some(center) = queue.pop() {
        let lookaheads = table[&center].clone();
        let production = grammar.production(center.production);
        if center.dot >= production.body.len() {
            continue;
        }
        if let Symbol::Nonterminal(nt) = production.body[center.dot] {
            let remainder = &production.body[center.dot + 1..];
            let propagated = first.first_of_sentence(remainder, &lookaheads);
            for &pid in grammar.productions_for(nt) {
                let new_center = Center {
                    production: pid,
                    dot: 0,
                };
                let existed = table.contains_key(&new_center);
                let entry = table.entry(new_center).or_default();
                let before = entry.len();
                entry.extend(propagated.iter().copied());
                if !existed || entry.len() != before {
                    queue.push(new_center);
                }
            }
        }
    }

    let mut items: Vec<Item> = table
        .into_iter()
        .map(|(center, lookaheads)| Item { center, lookaheads })
        .collect();
    items.sort_by_key(|i| i.center);
    items
}

/// `goto(I, X)` kernel: every item advanced past `X`, lookaheads carried
/// over unchanged. Callers close the result unless a bare kernel (e.g. for
/// core-comparison) is wanted.
pub fn goto_kernel<V>(grammar: &Grammar<V>, items: &[Item], symbol: Symbol) -> Vec<Item> {
    let mut table: FxHashMap<Center, BTreeSet<TerminalId>> = FxHashMap::default();
    for item in items {
        if item.symbol_at_dot(grammar) == Some(symbol) {
            let new_center = Center {
                production: item.center.production,
                dot: item.center.dot + 1,
            };
            table
                .entry(new_center)
                .or_default()
                .extend(item.lookaheads.iter().copied());
        }
    }
    let mut items: Vec<Item> = table
        .into_iter()
        .map(|(center, lookaheads)| Item { center, lookaheads })
        .collect();
    items.sort_by_key(|i| i.center);
    items
}

pub fn goto<V>(
    grammar: &Grammar<V>,
    first: &FirstSets,
    items: &[Item],
    symbol: Symbol,
    just_kernel: bool,
) -> Vec<Item> {
    let kernel = goto_kernel(grammar, items, symbol);
    if just_kernel {
        kernel
    } else {
        closure(grammar, first, kernel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub state: usize,
    pub symbol: TerminalId,
    pub kind: ConflictKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(ProductionId),
    Accept,
}

/// The fully built LALR(1) automaton: states (each with its closed item
/// set), and the collapsed ACTION/GOTO tables.
pub struct Tables {
    pub state_count: usize,
    action: FxHashMap<(usize, TerminalId), Action>,
    goto_table: FxHashMap<(usize, NonterminalId), usize>,
    error_terminal: TerminalId,
}

impl Tables {
    /// ACTION lookup with the `ERROR` wildcard: an exact `(state, terminal)`
    /// entry wins; if none exists, `(state, ERROR)` is tried instead, so the
    /// driver can treat ERROR as matching any lookahead without special-
    /// casing it itself.
    pub fn action(&self, state: usize, terminal: TerminalId) -> Option<Action> {
        self.action
            .get(&(state, terminal))
            .or_else(|| self.action.get(&(state, self.error_terminal)))
            .copied()
    }

    pub fn goto(&self, state: usize, nonterminal: NonterminalId) -> Option<usize> {
        self.goto_table.get(&(state, nonterminal)).copied()
    }
}

struct StateBuild {
    kernel: Vec<Center>,
    lookaheads: FxHashMap<Center, BTreeSet<TerminalId>>,
}

impl StateBuild {
    fn kernel_items(&self) -> Vec<Item> {
        self.kernel
            .iter()
            .map(|&center| Item {
                center,
                lookaheads: self.lookaheads[&center].clone(),
            })
            .collect()
    }
}

fn core_key(items: &[Item]) -> Vec<Center> {
    let mut centers: Vec<Center> = items.iter().map(|i| i.center).collect();
    centers.sort();
    centers
}

/// Registrar that accumulates every write to an ACTION cell; the first
/// duplicate entry in a cell materializes a conflict.
struct ActionRegistrar {
    cells: FxHashMap<(usize, TerminalId), Vec<Action>>,
}

impl ActionRegistrar {
    fn new() -> Self {
        ActionRegistrar {
            cells: FxHashMap::default(),
        }
    }

    fn write(&mut self, state: usize, terminal: TerminalId, action: Action) {
        self.cells.entry((state, terminal)).or_default().push(action);
    }

    fn finish(self) -> (FxHashMap<(usize, TerminalId), Action>, Vec<Conflict>) {
        let mut collapsed = FxHashMap::default();
        let mut conflicts = Vec::new();
        for ((state, terminal), mut actions) in self.cells {
            actions.dedup_by(|a, b| a == b);
            if actions.len() > 1 {
                let kind = if actions
                    .iter()
                    .all(|a| matches!(a, Action::Reduce(_)))
                {
                    ConflictKind::ReduceReduce
                } else {
                    ConflictKind::ShiftReduce
                };
                conflicts.push(Conflict {
                    state,
                    symbol: terminal,
                    kind,
                });
            }
            collapsed.insert((state, terminal), actions[0]);
        }
        (collapsed, conflicts)
    }
}

/// Builds the LALR(1) automaton by core-merging LR(1) states: states are
/// keyed by kernel center sets, and revisiting a known core unions the new
/// lookaheads into the existing state, re-enqueuing it if the union grew so
/// the propagation reaches every downstream state.
pub fn build_lalr<V>(grammar: &Grammar<V>) -> Result<Tables, Vec<Conflict>>
where
    V: 'static,
{
    let first = FirstSets::compute(grammar);

    let augmented_start = grammar.start();
    let start_production = grammar
        .productions_for(augmented_start)
        .first()
        .copied()
        .expect("augmented grammar must have a start production");

    let mut start_lookaheads = BTreeSet::new();
    start_lookaheads.insert(grammar.eof);
    let start_center = Center {
        production: start_production,
        dot: 0,
    };

    let mut core_to_state: FxHashMap<Vec<Center>, usize> = FxHashMap::default();
    let mut states: Vec<StateBuild> = Vec::new();

    let mut initial_lookaheads = FxHashMap::default();
    initial_lookaheads.insert(start_center, start_lookaheads);
    states.push(StateBuild {
        kernel: vec![start_center],
        lookaheads: initial_lookaheads,
    });
    core_to_state.insert(vec![start_center], 0);

    let mut shifts: FxHashMap<(usize, TerminalId), usize> = FxHashMap::default();
    let mut gotos: FxHashMap<(usize, NonterminalId), usize> = FxHashMap::default();

    let mut worklist = vec![0usize];
    while let Some(state_idx) = worklist.pop() {
        let closed = closure(grammar, &first, states[state_idx].kernel_items());

        let mut by_symbol: FxHashSet<Symbol> = FxHashSet::default();
        for item in &closed {
            if let Some(symbol) = item.symbol_at_dot(grammar) {
                by_symbol.insert(symbol);
            }
        }

        for symbol in by_symbol.iter().copied() {
            let target_items = goto(grammar, &first, &closed, symbol, false);
            if target_items.is_empty() {
                continue;
            }
            let core = core_key(&target_items);

            let target_idx = if let Some(&existing) = core_to_state.get(&core) {
                let mut grew = false;
                for item in &target_items {
                    let entry = states[existing]
                        .lookaheads
                        .entry(item.center)
                        .or_default();
                    let before = entry.len();
                    entry.extend(item.lookaheads.iter().copied());
                    if entry.len() != before {
                        grew = true;
                    }
                }
                if grew && !worklist.contains(&existing) {
                    worklist.push(existing);
                }
                existing
            } else {
                let idx = states.len();
                let mut lookaheads = FxHashMap::default();
                for item in &target_items {
                    lookaheads.insert(item.center, item.lookaheads.clone());
                }
                states.push(StateBuild {
                    kernel: core.clone(),
                    lookaheads,
                });
                core_to_state.insert(core, idx);
                worklist.push(idx);
                idx
            };

            match symbol {
                Symbol::Terminal(t) => {
                    shifts.insert((state_idx, t), target_idx);
                }
                Symbol::Nonterminal(nt) => {
                    gotos.insert((state_idx, nt), target_idx);
                }
            }
        }
    }

    let mut registrar = ActionRegistrar::new();
    for (state_idx, state) in states.iter().enumerate() {
        let closed = closure(grammar, &first, state.kernel_items());
        for item in &closed {
            if item.can_reduce(grammar) {
                if item.center.production == start_production {
                    registrar.write(state_idx, grammar.eof, Action::Accept);
                } else {
                    for &lookahead in &item.lookaheads {
                        registrar.write(state_idx, lookahead, Action::Reduce(item.center.production));
                    }
                }
            }
        }
        for symbol in grammar.terminals() {
            if let Some(&target) = shifts.get(&(state_idx, symbol)) {
                registrar.write(state_idx, symbol, Action::Shift(target));
            }
        }
    }

    let (action, conflicts) = registrar.finish();
    if !conflicts.is_empty() {
        return Err(conflicts);
    }

    Ok(Tables {
        state_count: states.len(),
        action,
        goto_table: gotos,
        error_terminal: grammar.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use std::rc::Rc;

    // S -> E ; E -> E '+' T | T ; T -> 'id'
    fn arithmetic_grammar() -> Grammar<i32> {
        let mut g: Grammar<i32> = Grammar::new();
        let plus = g.add_terminal("+");
        let id = g.add_terminal("id");
        let e = g.add_nonterminal("E");
        let t = g.add_nonterminal("T");
        g.set_start(e);

        let id_rule: crate::grammar::ReductionRule<i32> = Rc::new(|f| f.take(1));
        g.add_production(t, vec![Symbol::Terminal(id)], Some(id_rule));

        let t_to_e: crate::grammar::ReductionRule<i32> = Rc::new(|f| f.take(1));
        g.add_production(e, vec![Symbol::Nonterminal(t)], Some(t_to_e));

        let add_rule: crate::grammar::ReductionRule<i32> =
            Rc::new(|f| f.take(1) + f.take(3));
        g.add_production(
            e,
            vec![Symbol::Nonterminal(e), Symbol::Terminal(plus), Symbol::Nonterminal(t)],
            Some(add_rule),
        );

        g
    }

    #[test]
    fn builds_conflict_free_table_for_simple_grammar() {
        let mut g = arithmetic_grammar();
        g.augment();
        let tables = build_lalr(&g).expect("grammar should be conflict-free");
        assert!(tables.state_count > 0);
    }

    #[test]
    fn closure_expands_nonterminal_after_dot() {
        let g = arithmetic_grammar();
        let first = FirstSets::compute(&g);
        let e = g.start();
        let productions_for_e = g.productions_for(e);
        let start_item = Item {
            center: Center {
                production: productions_for_e[0],
                dot: 0,
            },
            lookaheads: [g.eof].into_iter().collect(),
        };
        let closed = closure(&g, &first, vec![start_item]);
        // Closure over E -> (*) T should also add T -> (*) 'id'.
        assert!(closed.len() >= 2);
    }
}
