//! Completion candidates, including the mass-action rate law offered at
//! the start of an empty rate-law slot.

use serde::Serialize;

use crate::analysis::Analysis;
use crate::automaton::{Driver, Fed, RawTree, RawValue};
use crate::lalr::ParseTable;
use crate::lexer::{Spanned, Token};
use crate::parser;
use crate::position::Position;
use crate::tree::ast::{Reaction, Species};
use crate::tree::builder::build_tree;
use crate::tree::{NodeKind, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    /// A plain name.
    Text,
    /// A snippet with `${n:placeholder}` tab stops.
    RateLaw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    pub kind: CompletionKind,
}

impl Completion {
    fn new(text: impl Into<String>, kind: CompletionKind) -> Self {
        Completion {
            text: text.into(),
            kind,
        }
    }
}

/// Every known name, followed by a rate-law snippet when `pos` is the
/// start of a reaction's empty rate law.
pub fn completions(table: &ParseTable, analysis: &Analysis, pos: Position) -> Vec<Completion> {
    let mut out: Vec<Completion> = analysis
        .table()
        .all_names()
        .into_iter()
        .map(|name| Completion::new(name, CompletionKind::Text))
        .collect();

    let mut text = analysis.tree().source();
    text.pop();
    let driver = parser::parse_until(table, &text, pos);
    if let Some(reaction) = pending_reaction(&driver, pos) {
        let tree = build_tree(
            RawTree {
                kind: NodeKind::FileNode,
                children: vec![Some(RawValue::Tree(reaction))],
            },
            String::new(),
            0,
        );
        if let Some(snippet) = rate_law_snippet(&tree, analysis) {
            out.push(Completion::new(snippet, CompletionKind::RateLaw));
        }
    }
    out
}

/// Probe the driver with a number and a newline; if that completes a
/// reaction whose rate law is exactly the probe, the cursor was at the
/// start of its rate law.
fn pending_reaction(driver: &Driver<'_>, pos: Position) -> Option<RawTree> {
    if !driver.accepts(Token::Number) {
        return None;
    }
    let mut probe = driver.clone();
    if !matches!(probe.feed(Spanned::synthetic(Token::Number, pos, 0)), Fed::Shifted) {
        return None;
    }
    if !probe.accepts(Token::Newline) {
        return None;
    }
    if !matches!(probe.feed(Spanned::synthetic(Token::Newline, pos, 0)), Fed::Shifted) {
        return None;
    }
    let values = &probe.value_stack;
    let candidate = values.len().checked_sub(2).map(|i| &values[i])?;
    match candidate {
        RawValue::Tree(t) if t.kind == NodeKind::Reaction => Some(t.clone()),
        _ => None,
    }
}

fn rate_law_snippet(tree: &Tree, analysis: &Analysis) -> Option<String> {
    let reaction = tree
        .child(tree.root(), 0)
        .and_then(|id| Reaction::cast(tree, id))?;
    let rate_law = reaction.rate_law()?;
    if tree.kind(rate_law) != NodeKind::Number {
        return None;
    }
    let name = match reaction.reaction_name().map(|n| n.text()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => analysis.table().unique_name("J", None),
    };
    Some(mass_action(
        &name,
        &reaction.reactants(),
        &reaction.products(),
        reaction.is_reversible(),
    ))
}

/// `${1:k_f_J} * A^2 * B` with a `- ${2:k_b_J} * ...` term for
/// reversible reactions.
fn mass_action(name: &str, reactants: &[Species<'_>], products: &[Species<'_>], reversible: bool) -> String {
    let mut snippet = format!("${{1:k_f_{}}}{}", name, factors(reactants));
    if reversible {
        snippet.push_str(&format!(" - ${{2:k_b_{}}}{}", name, factors(products)));
    }
    snippet
}

fn factors(species: &[Species<'_>]) -> String {
    species
        .iter()
        .map(|s| {
            let stoich = s.stoich();
            if stoich == 1.0 {
                format!(" * {}", s.text())
            } else {
                format!(" * {}^{}", s.text(), stoich)
            }
        })
        .collect()
}
