//! Resolution of the statements pass 1 queued: annotations first, then
//! display names, then rate rules.

use crate::issue::Issue;
use crate::scope::Scope;
use crate::symbols::{Flags, QName, SymbolTable, SymbolType};
use crate::tree::ast::{Annotation, IsAssignment, RateRule};
use crate::tree::Tree;

use super::collect::Pending;
use super::expr_names;

pub(super) fn resolve(tree: &Tree, table: &mut SymbolTable, pending: Pending<'_>) {
    for (scope, annotation) in &pending.annotations {
        annotate(tree, table, scope, annotation);
    }
    for (scope, alias) in &pending.aliases {
        display_name(table, scope, alias);
    }
    for (scope, rule) in &pending.rate_rules {
        rate_rule(tree, table, scope, rule);
    }
}

fn annotate(tree: &Tree, table: &mut SymbolTable, scope: &Scope, annotation: &Annotation<'_>) {
    let Some(var) = annotation.var_name() else { return };
    let Some(name) = var.name() else { return };
    let qname = QName::new(scope.clone(), name);
    // models and functions keep their own type
    if table.lookup(scope, var.text()).is_none() {
        table.insert(tree, &qname, SymbolType::Parameter, None, None, Flags::default());
    }
    table.insert_annotation(tree, &qname, annotation.id);
}

fn display_name(table: &mut SymbolTable, scope: &Scope, alias: &IsAssignment<'_>) {
    let Some(var) = alias.var_name() else { return };
    let name = var.text();
    let owner = if table.lookup(scope, name).is_some() {
        scope.clone()
    } else {
        Scope::Global
    };
    table.set_display_name(&owner, name, alias.display_name(), alias.range());
}

fn rate_rule(tree: &Tree, table: &mut SymbolTable, scope: &Scope, rule: &RateRule<'_>) {
    let Some(name) = rule.name() else { return };
    let text = rule.text();
    let range = tree.range(name);

    let mut issues = Vec::new();
    let owner = if table.lookup(scope, text).is_some() {
        Some(scope.clone())
    } else if table.lookup(&Scope::Global, text).is_some() {
        Some(Scope::Global)
    } else {
        None
    };
    match owner.as_ref().and_then(|o| table.lookup_mut(o, text)) {
        None => issues.push(Issue::var_not_found(range, text)),
        Some(sym) => {
            if sym.typ == SymbolType::Species && !sym.is_const && sym.in_reaction {
                issues.push(Issue::rate_rule_not_in_reaction(range, text));
            }
            let expr = rule.value().map(|v| tree.flat_text(v)).unwrap_or_default();
            if let Some(previous) = sym.rate_rule.replace(expr) {
                issues.push(Issue::rate_rule_overridden(rule.range(), text, &previous));
            }
        }
    }

    if let Some(value) = rule.value() {
        for name in expr_names(tree, value) {
            if table.resolve(scope, tree.text(name)).is_none() {
                issues.push(Issue::var_not_found(tree.range(name), tree.text(name)));
            }
        }
    }
    for issue in issues {
        table.push_issue(issue);
    }
}
