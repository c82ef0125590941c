//! The grammar model: symbols, sentences, and attributed productions.

use std::rc::Rc;

/// A terminal, identified by its position in the grammar's insertion-ordered
/// terminal list. Two terminal ids are equal iff they name the same
/// terminal within the same grammar (symbols are equal by identity within a
/// grammar, never by name across grammars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonterminalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
}

/// An ordered tuple of symbols forming a production body. The empty
/// sentence is how epsilon productions are encoded.
pub type Sentence = Vec<Symbol>;

/// The positional frame a reduction rule runs over: index `1..=n` are the
/// symbol attributes already synthesized by earlier reductions; the rule's
/// return value becomes the synthesized attribute at index 0.
///
/// Attributes are taken (moved) out rather than cloned, since rule closures
/// build AST nodes by allocation only and must not duplicate children.
pub struct ReductionFrame<V> {
    attrs: Vec<Option<V>>,
}

impl<V> ReductionFrame<V> {
    pub fn new(attrs: Vec<V>) -> Self {
        ReductionFrame {
            attrs: attrs.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Take attribute `index` (1-based, matching the spec's frame indexing).
    pub fn take(&mut self, index: usize) -> V {
        self.attrs[index - 1]
            .take()
            .expect("reduction frame attribute already taken")
    }
}

pub type ReductionRule<V> = Rc<dyn Fn(&mut ReductionFrame<V>) -> V>;

/// An attributed production: `head -> body`, with an optional reduction
/// rule. Productions with no rule (e.g. pure error productions whose value
/// is never consumed) carry `rule: None`.
pub struct Production<V> {
    pub id: ProductionId,
    pub head: NonterminalId,
    pub body: Sentence,
    pub rule: Option<ReductionRule<V>>,
}

impl<V> Production<V> {
    /// True if this production's body contains the `ERROR` wildcard
    /// terminal, i.e. it is usable as a local-recovery error production.
    pub fn is_error_production(&self, error: TerminalId) -> bool {
        self.body
            .iter()
            .any(|s| matches!(s, Symbol::Terminal(t) if *t == error))
    }
}

/// Owns the grammar's terminals, non-terminals, and productions in
/// insertion order (insertion order is enumeration order for table
/// building). Built incrementally, then consumed by [`crate::lr::build_lalr`].
pub struct Grammar<V> {
    terminal_names: Vec<String>,
    nonterminal_names: Vec<String>,
    productions: Vec<Production<V>>,
    /// Productions grouped by head, in declaration order, for `productions_for`.
    by_nonterminal: Vec<Vec<ProductionId>>,
    pub eof: TerminalId,
    pub error: TerminalId,
    pub epsilon: TerminalId,
    start: Option<NonterminalId>,
}

impl<V> Grammar<V> {
    /// A fresh grammar with the three reserved terminals pre-declared:
    /// `EOF` (the sentinel end-of-input terminal), `ERROR` (the wildcard
    /// used in error productions), and an explicit `Epsilon` terminal
    /// (epsilon is also encoded directly as the empty sentence, but having
    /// a terminal id for it lets FIRST-set computations treat it uniformly).
    pub fn new() -> Self {
        let mut terminal_names = Vec::new();
        terminal_names.push("EOF".to_string());
        terminal_names.push("ERROR".to_string());
        terminal_names.push("Epsilon".to_string());
        Grammar {
            terminal_names,
            nonterminal_names: Vec::new(),
            productions: Vec::new(),
            by_nonterminal: Vec::new(),
            eof: TerminalId(0),
            error: TerminalId(1),
            epsilon: TerminalId(2),
            start: None,
        }
    }

    pub fn add_terminal(&mut self, name: impl Into<String>) -> TerminalId {
        let id = TerminalId(self.terminal_names.len() as u32);
        self.terminal_names.push(name.into());
        id
    }

    pub fn add_nonterminal(&mut self, name: impl Into<String>) -> NonterminalId {
        let id = NonterminalId(self.nonterminal_names.len() as u32);
        self.nonterminal_names.push(name.into());
        self.by_nonterminal.push(Vec::new());
        id
    }

    pub fn set_start(&mut self, start: NonterminalId) {
        self.start = Some(start);
    }

    pub fn start(&self) -> NonterminalId {
        self.start.expect("grammar start symbol not set")
    }

    pub fn add_production(
        &mut self,
        head: NonterminalId,
        body: Sentence,
        rule: Option<ReductionRule<V>>,
    ) -> ProductionId {
        let id = ProductionId(self.productions.len() as u32);
        self.productions.push(Production {
            id,
            head,
            body,
            rule,
        });
        self.by_nonterminal[head.0 as usize].push(id);
        id
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_names.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.nonterminal_names.len()
    }

    pub fn terminal_name(&self, id: TerminalId) -> &str {
        &self.terminal_names[id.0 as usize]
    }

    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        &self.nonterminal_names[id.0 as usize]
    }

    pub fn production(&self, id: ProductionId) -> &Production<V> {
        &self.productions[id.0 as usize]
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production<V>> {
        self.productions.iter()
    }

    pub fn productions_for(&self, nt: NonterminalId) -> &[ProductionId] {
        &self.by_nonterminal[nt.0 as usize]
    }

    /// Terminals in declaration order, excluding the three reserved ones,
    /// used to drive the automaton's "terminals before non-terminals, in
    /// grammar order" alphabet walk.
    pub fn terminals(&self) -> impl Iterator<Item = TerminalId> + '_ {
        (0..self.terminal_names.len() as u32).map(TerminalId)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = NonterminalId> + '_ {
        (0..self.nonterminal_names.len() as u32).map(NonterminalId)
    }

    /// Adds the augmented start production `S' -> S` and returns its head
    /// and id. The rule is an identity pass-through of the single attribute.
    pub fn augment(&mut self) -> (NonterminalId, ProductionId)
    where
        V: 'static,
    {
        let augmented = self.add_nonterminal("S'");
        let start = self.start();
        let rule: ReductionRule<V> = Rc::new(|frame: &mut ReductionFrame<V>| frame.take(1));
        let prod = self.add_production(augmented, vec![Symbol::Nonterminal(start)], Some(rule));
        self.set_start(augmented);
        (augmented, prod)
    }
}

impl<V> Default for Grammar<V> {
    fn default() -> Self {
        Grammar::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_terminals_are_first() {
        let g: Grammar<()> = Grammar::new();
        assert_eq!(g.terminal_name(g.eof), "EOF");
        assert_eq!(g.terminal_name(g.error), "ERROR");
        assert_eq!(g.terminal_name(g.epsilon), "Epsilon");
    }

    #[test]
    fn production_insertion_order_is_preserved() {
        let mut g: Grammar<()> = Grammar::new();
        let a = g.add_terminal("a");
        let nt = g.add_nonterminal("S");
        g.set_start(nt);
        let p1 = g.add_production(nt, vec![Symbol::Terminal(a)], None);
        let p2 = g.add_production(nt, vec![], None);
        assert_eq!(g.productions_for(nt), &[p1, p2]);
    }

    #[test]
    fn error_production_detection() {
        let mut g: Grammar<()> = Grammar::new();
        let nt = g.add_nonterminal("S");
        g.set_start(nt);
        let p = g.add_production(nt, vec![Symbol::Terminal(g.error)], None);
        assert!(g.production(p).is_error_production(g.error));
    }
}
