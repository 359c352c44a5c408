//! Statement-level error recovery.
//!
//! On an error the automaton is rolled back to the innermost point where a
//! new statement could begin inside a file or block. Everything pushed
//! since that point is wrapped in an `ErrorNode`, the offending token is
//! kept as an `ErrorToken`, and both are attached to the enclosing list.

use crate::automaton::{Driver, RawTree, RawValue};
use crate::grammar::NonTerminal;
use crate::lalr::Action;
use crate::lexer::{Spanned, Token};
use crate::position::Position;
use crate::tree::NodeKind;

/// Placeholder statements fed before any input.
const PLACEHOLDERS: usize = 2;

fn dummy_newline() -> Spanned {
    Spanned::synthetic(Token::Newline, Position::start(), 0)
}

pub(super) fn prime(driver: &mut Driver) {
    for _ in 0..PLACEHOLDERS {
        driver.feed(dummy_newline());
    }
}

/// Bring `driver` back to a state where a statement can start.
///
/// `offending` is attached after the discarded values; pass `None` at the
/// end of input, in which case `at_end` makes sure the chosen state can
/// accept `$END`.
pub(super) fn recover(driver: &mut Driver, offending: Option<RawValue>, at_end: bool) {
    let table = driver.table();

    // A complete small statement only lacks its separator: close it.
    if let Action::Reduce(prod) = driver.action(Token::Newline) {
        if table.grammar().productions[prod as usize].lhs == NonTerminal::SimpleStmt {
            driver.feed(dummy_newline());
        }
    }

    let boundary = (1..driver.state_stack.len()).rev().find(|&i| {
        let host = &driver.value_stack[i - 1];
        table.goto(driver.state_stack[i], NonTerminal::SimpleStmt).is_some()
            && matches!(
                host.kind(),
                Some(NodeKind::FileNode) | Some(NodeKind::SimpleStmtList)
            )
            && (!at_end || table.would_accept(&driver.state_stack[..=i], Token::Eof))
    });

    match boundary {
        Some(i) => {
            let values = driver.value_stack.split_off(i);
            driver.truncate_to(i);
            if let Some(host) = driver.value_stack.last_mut().and_then(RawValue::as_tree_mut) {
                attach(host, values, offending);
            }
        }
        None => {
            tracing::debug!("no statement boundary on the stack, restarting");
            let values = std::mem::take(&mut driver.value_stack);
            driver.state_stack.truncate(1);
            prime(driver);
            if let Some(host) = driver
                .value_stack
                .iter_mut()
                .find(|v| v.kind() == Some(NodeKind::FileNode))
                .and_then(RawValue::as_tree_mut)
            {
                attach(host, values, offending);
            }
        }
    }
}

fn attach(host: &mut RawTree, values: Vec<RawValue>, offending: Option<RawValue>) {
    let lone_dummy = values.len() == 1 && values[0].is_dummy();
    if !values.is_empty() && !lone_dummy {
        host.children.push(Some(RawValue::Tree(RawTree {
            kind: NodeKind::ErrorNode,
            children: values.into_iter().map(Some).collect(),
        })));
    }
    if let Some(tok) = offending {
        host.children.push(Some(tok));
    }
}

/// Drop the leading statements built from the priming newlines.
pub(super) fn strip_placeholders(root: &mut RawTree) {
    let count = root
        .children
        .iter()
        .take(PLACEHOLDERS)
        .take_while(|child| child.as_ref().is_some_and(is_placeholder))
        .count();
    root.children.drain(..count);
}

fn is_placeholder(value: &RawValue) -> bool {
    match value {
        RawValue::Tree(t) if t.kind == NodeKind::SimpleStmt => t
            .children
            .iter()
            .all(|c| c.as_ref().map_or(true, RawValue::is_dummy)),
        _ => false,
    }
}
