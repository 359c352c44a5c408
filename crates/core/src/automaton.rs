//! The pushdown automaton that runs a [`ParseTable`].
//!
//! The driver is fed one token at a time and exposes its state and value
//! stacks so error recovery can inspect and rewrite them. It is cheap to
//! clone, which lets callers probe "what if" continuations without
//! disturbing the real parse.

use crate::grammar::Build;
use crate::lalr::{Action, ParseTable};
use crate::lexer::{Spanned, Token};
use crate::tree::NodeKind;

/// A value on the automaton's value stack.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Token(Spanned),
    /// A token the parser could not place.
    ErrorToken(Spanned),
    Tree(RawTree),
}

/// An interior node built by a reduction. Empty slots stand for optional
/// grammar symbols that were absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTree {
    pub kind: NodeKind,
    pub children: Vec<Option<RawValue>>,
}

impl RawValue {
    /// The placeholder newline fed by error recovery. Real newlines always
    /// have text.
    pub fn is_dummy(&self) -> bool {
        matches!(self, RawValue::Token(s) if s.token == Token::Newline && s.text.is_empty())
    }

    pub fn as_tree(&self) -> Option<&RawTree> {
        match self {
            RawValue::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut RawTree> {
        match self {
            RawValue::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// The kind of the value when it is a tree.
    pub fn kind(&self) -> Option<NodeKind> {
        self.as_tree().map(|t| t.kind)
    }
}

/// Outcome of [`Driver::feed`].
#[derive(Debug)]
pub enum Fed {
    Shifted,
    /// `$END` was accepted; carries the root value.
    Accepted(RawValue),
    /// The token cannot continue the parse from the current state. The
    /// stacks reflect any reductions already performed.
    Rejected(Spanned),
}

#[derive(Debug, Clone)]
pub struct Driver<'t> {
    table: &'t ParseTable,
    pub state_stack: Vec<u32>,
    pub value_stack: Vec<RawValue>,
}

impl<'t> Driver<'t> {
    pub fn new(table: &'t ParseTable) -> Self {
        Driver {
            table,
            state_stack: vec![0],
            value_stack: Vec::new(),
        }
    }

    pub fn table(&self) -> &'t ParseTable {
        self.table
    }

    pub fn top(&self) -> u32 {
        self.state_stack.last().copied().unwrap_or(0)
    }

    /// The action the current state takes on `tok`, without running it.
    pub fn action(&self, tok: Token) -> Action {
        self.table.action(self.top(), tok)
    }

    /// Whether `tok` can be fed without error from the current state.
    pub fn accepts(&self, tok: Token) -> bool {
        self.table.would_accept(&self.state_stack, tok)
    }

    /// Feed one token, running every reduction it triggers.
    pub fn feed(&mut self, tok: Spanned) -> Fed {
        loop {
            match self.action(tok.token) {
                Action::Shift(next) => {
                    self.state_stack.push(next);
                    self.value_stack.push(RawValue::Token(tok));
                    return Fed::Shifted;
                }
                Action::Reduce(prod) => {
                    if !self.reduce(prod as usize) {
                        return Fed::Rejected(tok);
                    }
                }
                Action::Accept => {
                    self.state_stack.truncate(1);
                    return match self.value_stack.pop() {
                        Some(root) => Fed::Accepted(root),
                        None => Fed::Rejected(tok),
                    };
                }
                Action::Error => return Fed::Rejected(tok),
            }
        }
    }

    /// Truncate both stacks so that `state_stack[index]` is the top state.
    pub fn truncate_to(&mut self, index: usize) {
        self.state_stack.truncate(index + 1);
        self.value_stack.truncate(index);
    }

    fn reduce(&mut self, prod: usize) -> bool {
        let production = &self.table.grammar().productions[prod];
        let len = production.rhs.len();
        if self.value_stack.len() < len {
            return false;
        }
        let values = self.value_stack.split_off(self.value_stack.len() - len);
        self.state_stack.truncate(self.state_stack.len() - len);

        let value = build(&production.build, values);
        let Some(next) = self.table.goto(self.top(), production.lhs) else {
            return false;
        };
        self.state_stack.push(next);
        self.value_stack.push(value);
        true
    }
}

fn build(action: &Build, values: Vec<RawValue>) -> RawValue {
    match action {
        Build::Node { kind, slots } => {
            let mut values: Vec<Option<RawValue>> = values.into_iter().map(Some).collect();
            let children = slots
                .iter()
                .map(|slot| slot.and_then(|i| values[i].take()))
                .collect();
            RawValue::Tree(RawTree {
                kind: *kind,
                children,
            })
        }
        Build::Extend => {
            let mut values = values.into_iter();
            match values.next() {
                Some(RawValue::Tree(mut list)) => {
                    list.children.extend(values.map(Some));
                    RawValue::Tree(list)
                }
                first => RawValue::Tree(RawTree {
                    kind: NodeKind::ErrorNode,
                    children: first.into_iter().chain(values).map(Some).collect(),
                }),
            }
        }
        Build::Lift { .. } if values.len() == 1 => pass(values),
        Build::Lift { kind } => RawValue::Tree(RawTree {
            kind: *kind,
            children: values.into_iter().map(Some).collect(),
        }),
        Build::Pass | Build::Accept => pass(values),
    }
}

fn pass(values: Vec<RawValue>) -> RawValue {
    values.into_iter().next().unwrap_or(RawValue::Tree(RawTree {
        kind: NodeKind::ErrorNode,
        children: Vec::new(),
    }))
}
