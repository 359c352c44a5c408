//! The Antimony grammar artifact.
//!
//! Productions are written once here and compiled into an LALR(1) table
//! by [`crate::lalr`]. Each production also says how its value is built
//! when the automaton reduces it: a node with fixed child slots, a list
//! node extended by one more element, or a transparent pass-through.
//!
//! Optional symbols (`?` suffix in [`rule`]) are expanded into one
//! production per present/absent combination; absent symbols keep their
//! slot as an empty placeholder so typed accessors can index children by
//! fixed offsets.

use crate::lexer::Token;
use crate::tree::NodeKind;

/// Grammar nonterminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NonTerminal {
    /// Augmented start symbol `root' -> root`
    Start,
    Root,
    Items,
    SimpleStmt,
    SmallStmt,
    SimpleStmtList,
    Model,
    ModularModel,
    Function,
    Reaction,
    ReactionName,
    SpeciesList,
    Species,
    Assignment,
    RateRule,
    Declaration,
    DeclModifiers,
    DeclItem,
    DeclAssignment,
    Annotation,
    UnitDeclaration,
    UnitAssignment,
    VariableIn,
    IsAssignment,
    ModularModelCall,
    FunctionCall,
    NameMaybeIn,
    VarName,
    InComp,
    Parameters,
    Sum,
    Product,
    Power,
    Atom,
    FuncCall,
}

impl NonTerminal {
    pub const COUNT: usize = NonTerminal::FuncCall as usize + 1;

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    T(Token),
    N(NonTerminal),
}

/// How a reduction turns the popped values into a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Build {
    /// A node of `kind` whose slots take the rhs value at the given index,
    /// or stay empty.
    Node {
        kind: NodeKind,
        slots: Vec<Option<usize>>,
    },
    /// The first rhs value is a list node; append the remaining values.
    Extend,
    /// A single rhs value is passed through unchanged. With more than one
    /// value, a node of `kind` is built from all of them in order.
    Lift { kind: NodeKind },
    /// The first rhs value is passed through unchanged.
    Pass,
    /// Accept: the root value is the parse result.
    Accept,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub lhs: NonTerminal,
    pub rhs: Vec<Symbol>,
    pub build: Build,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    pub productions: Vec<Production>,
    pub start: NonTerminal,
}

impl Grammar {
    pub fn productions_of(&self, lhs: NonTerminal) -> impl Iterator<Item = (usize, &Production)> {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.lhs == lhs)
    }
}

// ──────────────────────────────────────────────
// Rule-writing helpers
// ──────────────────────────────────────────────

/// One rhs element of a rule written with [`rule`]; `optional` elements
/// are expanded away.
#[derive(Clone, Copy)]
struct Elem {
    sym: Symbol,
    optional: bool,
}

fn t(tok: Token) -> Elem {
    Elem {
        sym: Symbol::T(tok),
        optional: false,
    }
}

fn n(nt: NonTerminal) -> Elem {
    Elem {
        sym: Symbol::N(nt),
        optional: false,
    }
}

fn opt(e: Elem) -> Elem {
    Elem {
        optional: true,
        ..e
    }
}

struct Builder {
    productions: Vec<Production>,
}

impl Builder {
    fn push(&mut self, lhs: NonTerminal, rhs: Vec<Symbol>, build: Build) {
        self.productions.push(Production { lhs, rhs, build });
    }

    /// A node rule with one slot per element. Every combination of the
    /// optional elements becomes its own production. With `nonempty`,
    /// the combination where every element is absent is skipped.
    fn rule(&mut self, lhs: NonTerminal, kind: NodeKind, elems: &[Elem], nonempty: bool) {
        let optional: Vec<usize> = (0..elems.len()).filter(|&i| elems[i].optional).collect();
        // Full presence first so the longest alternative wins reduce/reduce ties.
        for mask in (0..(1u32 << optional.len())).rev() {
            let mut rhs = Vec::new();
            let mut slots = Vec::with_capacity(elems.len());
            for (i, elem) in elems.iter().enumerate() {
                let present = match optional.iter().position(|&o| o == i) {
                    Some(bit) => mask & (1 << bit) != 0,
                    None => true,
                };
                if present {
                    slots.push(Some(rhs.len()));
                    rhs.push(elem.sym);
                } else {
                    slots.push(None);
                }
            }
            if nonempty && rhs.is_empty() {
                continue;
            }
            self.push(lhs, rhs, Build::Node { kind, slots });
        }
    }

    /// `lhs -> first | lhs sep? item` as a flat list node.
    fn list(&mut self, lhs: NonTerminal, kind: NodeKind, item: Symbol, sep: Option<Token>) {
        self.push(
            lhs,
            vec![item],
            Build::Node {
                kind,
                slots: vec![Some(0)],
            },
        );
        let mut rhs = vec![Symbol::N(lhs)];
        if let Some(sep) = sep {
            rhs.push(Symbol::T(sep));
        }
        rhs.push(item);
        self.push(lhs, rhs, Build::Extend);
    }

    fn pass(&mut self, lhs: NonTerminal, sym: Symbol) {
        self.push(lhs, vec![sym], Build::Pass);
    }

    fn lift(&mut self, lhs: NonTerminal, kind: NodeKind, rhs: &[Symbol]) {
        self.push(lhs, rhs.to_vec(), Build::Lift { kind });
    }
}

// ──────────────────────────────────────────────
// The grammar
// ──────────────────────────────────────────────

/// Build the Antimony grammar. Production order matters only for
/// reduce/reduce ties, which go to the earlier production.
pub fn antimony() -> Grammar {
    use NonTerminal as N;
    use Symbol::{N as Nt, T as Tk};
    use Token as T;

    let mut b = Builder {
        productions: Vec::new(),
    };

    b.push(N::Start, vec![Nt(N::Root)], Build::Accept);

    // root: items?   (items are spliced into the file node)
    b.push(
        N::Root,
        vec![Nt(N::Items)],
        Build::Lift {
            kind: NodeKind::FileNode,
        },
    );
    b.push(
        N::Root,
        vec![],
        Build::Node {
            kind: NodeKind::FileNode,
            slots: vec![],
        },
    );
    for item in [N::SimpleStmt, N::Model, N::ModularModel, N::Function] {
        b.push(
            N::Items,
            vec![Nt(item)],
            Build::Node {
                kind: NodeKind::FileNode,
                slots: vec![Some(0)],
            },
        );
        b.push(N::Items, vec![Nt(N::Items), Nt(item)], Build::Extend);
    }

    // ── blocks ──────────────────────────────────────
    b.list(N::SimpleStmtList, NodeKind::SimpleStmtList, Nt(N::SimpleStmt), None);
    b.rule(
        N::Model,
        NodeKind::Model,
        &[t(T::Model), n(N::VarName), n(N::SimpleStmtList), t(T::End)],
        false,
    );
    b.rule(
        N::ModularModel,
        NodeKind::ModularModel,
        &[
            t(T::Model),
            opt(t(T::Star)),
            n(N::VarName),
            t(T::LParen),
            opt(n(N::Parameters)),
            t(T::RParen),
            n(N::SimpleStmtList),
            t(T::End),
        ],
        false,
    );
    for sep in [T::Semicolon, T::Newline] {
        b.rule(
            N::Function,
            NodeKind::Function,
            &[
                t(T::Function),
                n(N::VarName),
                t(T::LParen),
                opt(n(N::Parameters)),
                t(T::RParen),
                t(T::Newline),
                n(N::Sum),
                opt(t(sep)),
                t(T::End),
            ],
            false,
        );
    }
    // The separator-less variants were generated twice above; drop repeats.
    dedup(&mut b.productions);

    // ── statements ──────────────────────────────────
    for sep in [T::Semicolon, T::Newline] {
        b.rule(
            N::SimpleStmt,
            NodeKind::SimpleStmt,
            &[opt(n(N::SmallStmt)), t(sep)],
            false,
        );
    }
    // Statement-level function calls come before assignments so that
    // `a = f(x)` reduces to a function call, not an expression.
    for stmt in [
        N::FunctionCall,
        N::Reaction,
        N::Assignment,
        N::RateRule,
        N::Declaration,
        N::Annotation,
        N::UnitDeclaration,
        N::UnitAssignment,
        N::VariableIn,
        N::IsAssignment,
        N::ModularModelCall,
    ] {
        b.pass(N::SmallStmt, Nt(stmt));
    }

    b.rule(
        N::Reaction,
        NodeKind::Reaction,
        &[
            opt(n(N::ReactionName)),
            opt(n(N::SpeciesList)),
            t(T::Arrow),
            opt(n(N::SpeciesList)),
            t(T::Semicolon),
            n(N::Sum),
            opt(n(N::InComp)),
        ],
        false,
    );
    b.rule(
        N::ReactionName,
        NodeKind::ReactionName,
        &[n(N::NameMaybeIn), t(T::Colon)],
        false,
    );
    b.list(N::SpeciesList, NodeKind::SpeciesList, Nt(N::Species), Some(T::Plus));
    b.rule(
        N::Species,
        NodeKind::Species,
        &[opt(t(T::Number)), opt(t(T::Dollar)), t(T::Name)],
        false,
    );
    for op in [T::Equal, T::ColonEqual] {
        b.rule(
            N::Assignment,
            NodeKind::Assignment,
            &[n(N::NameMaybeIn), t(op), n(N::Sum)],
            false,
        );
    }
    b.rule(
        N::RateRule,
        NodeKind::RateRule,
        &[t(T::Name), t(T::Prime), t(T::Equal), n(N::Sum)],
        false,
    );

    // declaration: decl_modifiers decl_item (',' decl_item)*
    b.rule(
        N::Declaration,
        NodeKind::Declaration,
        &[n(N::DeclModifiers), n(N::DeclItem)],
        false,
    );
    b.push(
        N::Declaration,
        vec![Nt(N::Declaration), Tk(T::Comma), Nt(N::DeclItem)],
        Build::Extend,
    );
    b.rule(
        N::DeclModifiers,
        NodeKind::DeclModifiers,
        &[
            opt(t(T::VarModifier)),
            opt(t(T::SubModifier)),
            opt(t(T::TypeModifier)),
        ],
        true,
    );
    b.rule(
        N::DeclItem,
        NodeKind::DeclItem,
        &[n(N::NameMaybeIn), opt(n(N::DeclAssignment))],
        false,
    );
    b.rule(
        N::DeclAssignment,
        NodeKind::DeclAssignment,
        &[t(T::Equal), n(N::Sum)],
        false,
    );

    b.rule(
        N::Annotation,
        NodeKind::Annotation,
        &[n(N::VarName), t(T::AnnotKeyword), t(T::Str)],
        false,
    );
    b.rule(
        N::UnitDeclaration,
        NodeKind::UnitDeclaration,
        &[t(T::Unit), n(N::VarName), t(T::Equal), n(N::Sum)],
        false,
    );
    b.rule(
        N::UnitAssignment,
        NodeKind::UnitAssignment,
        &[n(N::VarName), t(T::Has), n(N::Sum)],
        false,
    );
    b.rule(
        N::VariableIn,
        NodeKind::VariableIn,
        &[n(N::VarName), n(N::InComp)],
        false,
    );
    b.rule(
        N::IsAssignment,
        NodeKind::IsAssignment,
        &[n(N::VarName), t(T::Is), t(T::Str)],
        false,
    );
    b.rule(
        N::ModularModelCall,
        NodeKind::ModularModelCall,
        &[
            opt(n(N::ReactionName)),
            n(N::VarName),
            t(T::LParen),
            opt(n(N::Parameters)),
            t(T::RParen),
        ],
        false,
    );
    b.rule(
        N::FunctionCall,
        NodeKind::FunctionCall,
        &[
            n(N::NameMaybeIn),
            t(T::Equal),
            n(N::VarName),
            t(T::LParen),
            opt(n(N::Parameters)),
            t(T::RParen),
        ],
        false,
    );

    // ── names ───────────────────────────────────────
    b.rule(
        N::NameMaybeIn,
        NodeKind::NameMaybeIn,
        &[n(N::VarName), opt(n(N::InComp))],
        false,
    );
    b.rule(
        N::VarName,
        NodeKind::VarName,
        &[opt(t(T::Dollar)), t(T::Name)],
        false,
    );
    b.rule(
        N::InComp,
        NodeKind::InComp,
        &[t(T::In), n(N::VarName)],
        false,
    );
    b.list(N::Parameters, NodeKind::Parameters, Nt(N::Sum), Some(T::Comma));

    // ── expressions ─────────────────────────────────
    b.pass(N::Sum, Nt(N::Product));
    for op in [T::Plus, T::Minus] {
        b.lift(N::Sum, NodeKind::Sum, &[Nt(N::Sum), Tk(op), Nt(N::Product)]);
    }
    b.pass(N::Product, Nt(N::Power));
    for op in [T::Star, T::Slash] {
        b.lift(
            N::Product,
            NodeKind::Product,
            &[Nt(N::Product), Tk(op), Nt(N::Power)],
        );
    }
    b.pass(N::Power, Nt(N::Atom));
    b.lift(
        N::Power,
        NodeKind::Power,
        &[Nt(N::Power), Tk(T::Caret), Nt(N::Atom)],
    );
    b.pass(N::Atom, Tk(T::Number));
    b.pass(N::Atom, Nt(N::VarName));
    b.pass(N::Atom, Nt(N::FuncCall));
    b.lift(
        N::Atom,
        NodeKind::Atom,
        &[Tk(T::LParen), Nt(N::Sum), Tk(T::RParen)],
    );
    for op in [T::Minus, T::Plus] {
        b.lift(N::Atom, NodeKind::Atom, &[Tk(op), Nt(N::Atom)]);
    }
    b.rule(
        N::FuncCall,
        NodeKind::FuncCall,
        &[
            n(N::VarName),
            t(T::LParen),
            opt(n(N::Parameters)),
            t(T::RParen),
        ],
        false,
    );

    Grammar {
        productions: b.productions,
        start: N::Start,
    }
}

fn dedup(productions: &mut Vec<Production>) {
    let mut seen: Vec<(NonTerminal, Vec<Symbol>)> = Vec::new();
    productions.retain(|p| {
        let key = (p.lhs, p.rhs.clone());
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}
