//! Two-pass semantic analysis of a parsed tree.
//!
//! Pass 1 ([`collect`]) fills the symbol table container by container,
//! queueing annotations, display names and rate rules; the queues are
//! resolved ([`deferred`]) once every declaration has been seen. Pass 2
//! ([`validate`]) re-walks the tree checking references, calls and
//! compartments. Issues for recovery markers are gathered last
//! ([`syntax`]), so semantic issues always precede syntax issues.

mod collect;
mod deferred;
mod syntax;
mod validate;

use crate::issue::Issue;
use crate::symbols::SymbolTable;
use crate::tree::ast::FuncCall;
use crate::tree::{NodeId, NodeKind, Tree};

/// A parsed document together with its symbol table and diagnostics.
#[derive(Debug, Clone)]
pub struct Analysis {
    tree: Tree,
    table: SymbolTable,
    syntax_issues: Vec<Issue>,
}

/// Run both passes over `tree`.
pub fn analyze(tree: Tree) -> Analysis {
    let mut table = SymbolTable::new();
    let pending = collect::collect(&tree, &mut table);
    deferred::resolve(&tree, &mut table, pending);
    validate::validate(&tree, &mut table);
    let syntax_issues = syntax::syntax_issues(&tree);
    tracing::debug!(
        names = table.all_names().len(),
        semantic = table.issues().len(),
        syntax = syntax_issues.len(),
        "analysis complete"
    );
    Analysis {
        tree,
        table,
        syntax_issues,
    }
}

impl Analysis {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Issues from the symbol table and validation, in discovery order.
    pub fn semantic_issues(&self) -> &[Issue] {
        self.table.issues()
    }

    /// At most one issue per line, for error tokens and truncated
    /// statements.
    pub fn syntax_issues(&self) -> &[Issue] {
        &self.syntax_issues
    }

    /// Semantic issues followed by syntax issues.
    pub fn issues(&self) -> Vec<Issue> {
        self.semantic_issues()
            .iter()
            .chain(&self.syntax_issues)
            .cloned()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.semantic_issues()
            .iter()
            .chain(&self.syntax_issues)
            .any(Issue::is_error)
    }
}

// ──────────────────────────────────────────────
// Expression helpers
// ──────────────────────────────────────────────

/// `Name` leaves referenced by the expression at `id`. The callee of a
/// function call is not a reference; its arguments are.
pub(crate) fn expr_names(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_names(tree, id, &mut out);
    out
}

fn collect_names(tree: &Tree, id: NodeId, out: &mut Vec<NodeId>) {
    match tree.kind(id) {
        NodeKind::Name => out.push(id),
        NodeKind::FuncCall => {
            if let Some(params) = FuncCall::cast(tree, id).and_then(|c| c.params()) {
                collect_names(tree, params.id, out);
            }
        }
        _ => {
            for child in tree.children(id) {
                collect_names(tree, child, out);
            }
        }
    }
}

/// Function calls anywhere under `id`, outermost first.
pub(crate) fn func_calls(tree: &Tree, id: NodeId) -> Vec<FuncCall<'_>> {
    tree.descendants(id)
        .filter_map(|d| FuncCall::cast(tree, d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::issue::IssueKind;
    use crate::position::{Position, Range};
    use crate::scope::Scope;
    use crate::symbols::SymbolType;

    fn kinds(analysis: &Analysis) -> Vec<IssueKind> {
        analysis.issues().iter().map(|i| i.kind).collect()
    }

    fn r(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn basic_reaction_has_no_errors() {
        let ctx = Context::new();
        let analysis = ctx.analyze("J0: 2C + 3B -> 2.5D; k*C*B");
        let table = analysis.table();
        let typ = |n: &str| table.lookup(&Scope::Global, n).map(|s| s.typ);
        assert_eq!(typ("J0"), Some(SymbolType::Reaction));
        assert_eq!(typ("C"), Some(SymbolType::Species));
        assert_eq!(typ("B"), Some(SymbolType::Species));
        assert_eq!(typ("D"), Some(SymbolType::Species));
        assert_eq!(typ("k"), Some(SymbolType::Parameter));
        assert!(!analysis.has_errors());
    }

    #[test]
    fn issues_list_semantic_before_syntax() {
        let ctx = Context::new();
        let analysis = ctx.analyze("species a in c\nb = ");
        let found = kinds(&analysis);
        assert_eq!(found, vec![IssueKind::UninitCompt, IssueKind::UnexpectedEOF]);
    }

    #[test]
    fn undefined_compartment_is_registered_and_warned() {
        let ctx = Context::new();
        let analysis = ctx.analyze("species a in c");
        let c = analysis.table().lookup(&Scope::Global, "c").expect("c");
        assert_eq!(c.typ, SymbolType::Compartment);
        let issues = analysis.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UninitCompt);
        assert_eq!(issues[0].range, r(1, 14, 1, 15));
    }

    #[test]
    fn expr_names_skip_callees() {
        let ctx = Context::new();
        let tree = ctx.parse("a = f(x, g(y)) + z");
        let value = tree
            .descendants(tree.root())
            .find(|&d| tree.kind(d) == NodeKind::Assignment)
            .and_then(|a| tree.child(a, 2))
            .expect("value");
        let names: Vec<&str> = expr_names(&tree, value)
            .into_iter()
            .map(|n| tree.text(n))
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(func_calls(&tree, value).len(), 2);
    }
}
