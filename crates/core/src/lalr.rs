//! LALR(1) table construction.
//!
//! States are built from LR(0) kernels; lookaheads are propagated by
//! re-processing a state whenever a merge grows one of its kernel
//! lookahead sets. Conflicts are resolved statically: shift beats reduce,
//! and between two reductions the earlier production wins.

use std::collections::BTreeMap;

use crate::grammar::{Grammar, NonTerminal, Symbol};
use crate::lexer::Token;

/// A set of terminals, one bit per [`Token`].
type TermSet = u64;

const _: () = assert!(Token::COUNT <= 64);

fn bit(tok: Token) -> TermSet {
    1 << tok.index()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Error,
    Shift(u32),
    Reduce(u32),
    Accept,
}

/// Dense action and goto tables plus the grammar they were built from.
#[derive(Debug, Clone)]
pub struct ParseTable {
    grammar: Grammar,
    actions: Vec<[Action; Token::COUNT]>,
    gotos: Vec<[Option<u32>; NonTerminal::COUNT]>,
    conflicts: usize,
}

/// An LR(0) item: production index and dot position.
type Item = (usize, usize);

#[derive(Debug, Clone)]
struct State {
    kernel: BTreeMap<Item, TermSet>,
    transitions: BTreeMap<Symbol, usize>,
}

// ──────────────────────────────────────────────
// FIRST sets
// ──────────────────────────────────────────────

struct First {
    sets: [TermSet; NonTerminal::COUNT],
    nullable: [bool; NonTerminal::COUNT],
}

impl First {
    fn compute(grammar: &Grammar) -> Self {
        let mut first = First {
            sets: [0; NonTerminal::COUNT],
            nullable: [false; NonTerminal::COUNT],
        };
        let mut changed = true;
        while changed {
            changed = false;
            for prod in &grammar.productions {
                let (set, nullable) = first.of_sequence(&prod.rhs);
                let lhs = prod.lhs.index();
                if first.sets[lhs] | set != first.sets[lhs] {
                    first.sets[lhs] |= set;
                    changed = true;
                }
                if nullable && !first.nullable[lhs] {
                    first.nullable[lhs] = true;
                    changed = true;
                }
            }
        }
        first
    }

    /// FIRST of a symbol string, and whether the whole string is nullable.
    fn of_sequence(&self, symbols: &[Symbol]) -> (TermSet, bool) {
        let mut set = 0;
        for sym in symbols {
            match *sym {
                Symbol::T(tok) => return (set | bit(tok), false),
                Symbol::N(nt) => {
                    set |= self.sets[nt.index()];
                    if !self.nullable[nt.index()] {
                        return (set, false);
                    }
                }
            }
        }
        (set, true)
    }
}

// ──────────────────────────────────────────────
// Construction
// ──────────────────────────────────────────────

impl ParseTable {
    pub fn build(grammar: Grammar) -> Self {
        let first = First::compute(&grammar);
        let states = build_states(&grammar, &first);

        let mut actions = vec![[Action::Error; Token::COUNT]; states.len()];
        let mut gotos = vec![[None; NonTerminal::COUNT]; states.len()];
        let mut conflicts = 0;

        for (id, state) in states.iter().enumerate() {
            for (sym, &target) in &state.transitions {
                match *sym {
                    Symbol::T(tok) => actions[id][tok.index()] = Action::Shift(target as u32),
                    Symbol::N(nt) => gotos[id][nt.index()] = Some(target as u32),
                }
            }
            for ((prod, dot), lookahead) in closure(&grammar, &first, &state.kernel) {
                if dot < grammar.productions[prod].rhs.len() {
                    continue;
                }
                for tok in Token::ALL {
                    if lookahead & bit(tok) == 0 {
                        continue;
                    }
                    let slot = &mut actions[id][tok.index()];
                    let new = if prod == 0 {
                        Action::Accept
                    } else {
                        Action::Reduce(prod as u32)
                    };
                    *slot = match *slot {
                        Action::Error => new,
                        Action::Shift(_) => {
                            conflicts += 1;
                            tracing::debug!(state = id, ?tok, prod, "shift/reduce conflict, shifting");
                            *slot
                        }
                        Action::Reduce(other) => {
                            conflicts += 1;
                            tracing::debug!(state = id, ?tok, prod, other, "reduce/reduce conflict");
                            Action::Reduce(other.min(prod as u32))
                        }
                        Action::Accept => *slot,
                    };
                }
            }
        }

        tracing::debug!(
            states = states.len(),
            productions = grammar.productions.len(),
            conflicts,
            "built LALR(1) table"
        );

        ParseTable {
            grammar,
            actions,
            gotos,
            conflicts,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of statically resolved conflicts.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    pub fn action(&self, state: u32, tok: Token) -> Action {
        self.actions[state as usize][tok.index()]
    }

    pub fn goto(&self, state: u32, nt: NonTerminal) -> Option<u32> {
        self.gotos[state as usize][nt.index()]
    }

    /// Terminals with a non-error action in `state`.
    pub fn expected(&self, state: u32) -> Vec<Token> {
        Token::ALL
            .into_iter()
            .filter(|&t| self.action(state, t) != Action::Error)
            .collect()
    }

    /// Whether `tok` would eventually be shifted (or accepted) from the
    /// given state stack, running reductions on a scratch copy.
    pub fn would_accept(&self, states: &[u32], tok: Token) -> bool {
        let mut stack = states.to_vec();
        loop {
            let Some(&top) = stack.last() else {
                return false;
            };
            match self.action(top, tok) {
                Action::Shift(_) | Action::Accept => return true,
                Action::Error => return false,
                Action::Reduce(prod) => {
                    let prod = &self.grammar.productions[prod as usize];
                    let keep = stack.len().saturating_sub(prod.rhs.len());
                    stack.truncate(keep);
                    let Some(&under) = stack.last() else {
                        return false;
                    };
                    match self.goto(under, prod.lhs) {
                        Some(next) => stack.push(next),
                        None => return false,
                    }
                }
            }
        }
    }
}

fn closure(
    grammar: &Grammar,
    first: &First,
    kernel: &BTreeMap<Item, TermSet>,
) -> BTreeMap<Item, TermSet> {
    let mut items = kernel.clone();
    let mut work: Vec<Item> = items.keys().copied().collect();
    while let Some((prod, dot)) = work.pop() {
        let rhs = &grammar.productions[prod].rhs;
        let Some(Symbol::N(next)) = rhs.get(dot).copied() else {
            continue;
        };
        let lookahead = items[&(prod, dot)];
        let (mut follow, nullable) = first.of_sequence(&rhs[dot + 1..]);
        if nullable {
            follow |= lookahead;
        }
        for (q, _) in grammar.productions_of(next) {
            let entry = items.entry((q, 0)).or_insert(0);
            if *entry | follow != *entry {
                *entry |= follow;
                work.push((q, 0));
            }
        }
    }
    items
}

fn build_states(grammar: &Grammar, first: &First) -> Vec<State> {
    let mut states = vec![State {
        kernel: BTreeMap::from([((0, 0), bit(Token::Eof))]),
        transitions: BTreeMap::new(),
    }];
    let mut by_core: BTreeMap<Vec<Item>, usize> = BTreeMap::new();
    by_core.insert(vec![(0, 0)], 0);

    let mut work = vec![0usize];
    while let Some(id) = work.pop() {
        let items = closure(grammar, first, &states[id].kernel);

        let mut successors: BTreeMap<Symbol, BTreeMap<Item, TermSet>> = BTreeMap::new();
        for (&(prod, dot), &lookahead) in &items {
            if let Some(&sym) = grammar.productions[prod].rhs.get(dot) {
                *successors
                    .entry(sym)
                    .or_default()
                    .entry((prod, dot + 1))
                    .or_insert(0) |= lookahead;
            }
        }

        for (sym, kernel) in successors {
            let core: Vec<Item> = kernel.keys().copied().collect();
            let target = match by_core.get(&core) {
                Some(&existing) => {
                    let mut grew = false;
                    for (item, lookahead) in kernel {
                        let slot = states[existing].kernel.entry(item).or_insert(0);
                        if *slot | lookahead != *slot {
                            *slot |= lookahead;
                            grew = true;
                        }
                    }
                    if grew && !work.contains(&existing) {
                        work.push(existing);
                    }
                    existing
                }
                None => {
                    let new = states.len();
                    states.push(State {
                        kernel,
                        transitions: BTreeMap::new(),
                    });
                    by_core.insert(core, new);
                    work.push(new);
                    new
                }
            };
            states[id].transitions.insert(sym, target);
        }
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    #[test]
    fn build_is_deterministic() {
        let a = ParseTable::build(grammar::antimony());
        let b = ParseTable::build(grammar::antimony());
        assert_eq!(a.state_count(), b.state_count());
        for s in 0..a.state_count() as u32 {
            for t in Token::ALL {
                assert_eq!(a.action(s, t), b.action(s, t));
            }
        }
    }

    #[test]
    fn empty_input_is_accepted() {
        let table = ParseTable::build(grammar::antimony());
        assert!(table.would_accept(&[0], Token::Eof));
        assert!(table.would_accept(&[0], Token::Newline));
        assert!(!table.would_accept(&[0], Token::RParen));
    }

    #[test]
    fn statement_starts_are_expected() {
        let table = ParseTable::build(grammar::antimony());
        let expected = table.expected(0);
        for tok in [
            Token::Name,
            Token::Number,
            Token::Dollar,
            Token::Arrow,
            Token::Model,
            Token::Function,
            Token::Unit,
            Token::VarModifier,
            Token::Semicolon,
            Token::Newline,
        ] {
            assert!(expected.contains(&tok), "{:?} not expected at start", tok);
        }
        assert!(!expected.contains(&Token::Invalid));
    }
}
