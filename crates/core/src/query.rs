//! Position queries over an analyzed document: hover symbols,
//! go-to-definition and the document outline.

use serde::Serialize;

use crate::analysis::Analysis;
use crate::issue::Issue;
use crate::position::{Location, Position, Range};
use crate::scope::Scope;
use crate::symbols::{Symbol, SymbolType};
use crate::tree::ast::{Function, Model, ModularModel, Reaction};
use crate::tree::{NodeId, NodeKind, Tree};

/// An entry of the document outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineItem {
    pub name: String,
    pub kind: SymbolType,
    /// The whole construct.
    pub range: Range,
    /// Just the name.
    pub selection_range: Range,
}

impl Analysis {
    /// The symbols the name under `pos` resolves to, and the name's range.
    ///
    /// Descends from the root into whichever child contains `pos`, keeping
    /// track of the innermost model, module or function on the way. The
    /// name is looked up in that scope, then globally.
    pub fn symbols_at(&self, pos: Position) -> (Vec<&Symbol>, Option<Range>) {
        let tree = self.tree();
        let Some((scope, leaf)) = name_at(tree, pos) else {
            return (Vec::new(), None);
        };
        let found = self.table().resolve(&scope, tree.text(leaf));
        (found.into_iter().collect(), Some(tree.range(leaf)))
    }

    /// Definition sites of the name under `pos` in the document at `path`.
    ///
    /// An editor cursor often sits just after a name, so when nothing
    /// resolves the lookup is retried one column to the left and then one
    /// to the right.
    pub fn goto(&self, pos: Position, path: &str) -> Vec<Location> {
        let mut symbols = self.symbols_at(pos).0;
        if symbols.is_empty() && pos.column > 1 {
            symbols = self.symbols_at(pos.shifted(-1)).0;
        }
        if symbols.is_empty() {
            symbols = self.symbols_at(pos.shifted(1)).0;
        }
        symbols
            .into_iter()
            .map(|sym| Location {
                path: path.to_string(),
                range: self.tree().range(sym.def_node()),
            })
            .collect()
    }

    /// Every issue, semantic first.
    pub fn get_issues(&self) -> Vec<Issue> {
        self.issues()
    }

    /// Models, modules, functions and named reactions in document order.
    pub fn outline(&self) -> Vec<OutlineItem> {
        let tree = self.tree();
        tree.descendants(tree.root())
            .filter_map(|id| outline_item(tree, id))
            .collect()
    }
}

fn outline_item(tree: &Tree, id: NodeId) -> Option<OutlineItem> {
    let (kind, name) = match tree.kind(id) {
        NodeKind::Model => (SymbolType::Model, Model::cast(tree, id)?.name()?.name()?),
        NodeKind::ModularModel => (
            SymbolType::ModularModel,
            ModularModel::cast(tree, id)?.name()?.name()?,
        ),
        NodeKind::Function => (
            SymbolType::Function,
            Function::cast(tree, id)?.name()?.name()?,
        ),
        NodeKind::Reaction => (
            SymbolType::Reaction,
            Reaction::cast(tree, id)?.reaction_name()?.name()?,
        ),
        _ => return None,
    };
    Some(OutlineItem {
        name: tree.text(name).to_string(),
        kind,
        range: tree.range(id),
        selection_range: tree.range(name),
    })
}

/// The `Name` leaf containing `pos` and the scope it sits in.
fn name_at(tree: &Tree, pos: Position) -> Option<(Scope, NodeId)> {
    let mut current = tree.root();
    let mut scope = Scope::Global;
    if !tree.range(current).contains(pos) {
        return None;
    }
    loop {
        if let Some(inner) = block_scope(tree, current) {
            scope = inner;
        }
        match tree.children(current).find(|&c| tree.range(c).contains(pos)) {
            Some(child) => current = child,
            None => break,
        }
    }
    (tree.kind(current) == NodeKind::Name).then_some((scope, current))
}

fn block_scope(tree: &Tree, id: NodeId) -> Option<Scope> {
    let named = |name: Option<&str>| name.unwrap_or("").to_string();
    match tree.kind(id) {
        NodeKind::Model => {
            let model = Model::cast(tree, id)?;
            Some(Scope::Model(named(model.name().map(|v| v.text()))))
        }
        NodeKind::ModularModel => {
            let module = ModularModel::cast(tree, id)?;
            Some(Scope::Module(named(module.name().map(|v| v.text()))))
        }
        NodeKind::Function => {
            let function = Function::cast(tree, id)?;
            Some(Scope::Function(named(function.name().map(|v| v.text()))))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::position::{Position, Range};
    use crate::symbols::SymbolType;

    fn r(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn symbols_at_name() {
        let ctx = Context::new();
        let analysis = ctx.analyze("k1 = 3\nJ0: A -> B; k1*A");
        let (symbols, range) = analysis.symbols_at(Position::new(2, 13));
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "k1");
        assert_eq!(symbols[0].typ, SymbolType::Parameter);
        assert_eq!(range, Some(r(2, 13, 2, 15)));
    }

    #[test]
    fn symbols_at_nothing() {
        let ctx = Context::new();
        let analysis = ctx.analyze("k1 = 3");
        let (symbols, range) = analysis.symbols_at(Position::new(1, 4));
        assert!(symbols.is_empty());
        assert_eq!(range, None);
        assert!(analysis.symbols_at(Position::new(9, 1)).0.is_empty());
    }

    #[test]
    fn symbols_resolve_in_enclosing_model() {
        let ctx = Context::new();
        let analysis = ctx.analyze("x = 1\nmodel m\n  y = 2\n  z = x + y\nend");
        let (inner, _) = analysis.symbols_at(Position::new(4, 11));
        assert_eq!(inner[0].name, "y");
        let (outer, _) = analysis.symbols_at(Position::new(4, 7));
        assert_eq!(outer[0].name, "x");
    }

    #[test]
    fn goto_value_site() {
        let ctx = Context::new();
        let analysis = ctx.analyze("k = 1\nJ0: A -> B; k*A");
        let found = analysis.goto(Position::new(2, 13), "file.ant");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "file.ant");
        assert_eq!(found[0].range, r(1, 1, 1, 6));
    }

    #[test]
    fn goto_retries_left_of_cursor() {
        let ctx = Context::new();
        let analysis = ctx.analyze("k = 1\nb = k ");
        // cursor right after `k`
        let found = analysis.goto(Position::new(2, 6), "f");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range, r(1, 1, 1, 6));
    }

    #[test]
    fn goto_callable_uses_its_name() {
        let ctx = Context::new();
        let analysis = ctx.analyze("function f(x)\n  x\nend\na = f(2)");
        let found = analysis.goto(Position::new(4, 5), "f");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range, r(1, 10, 1, 11));
    }

    #[test]
    fn outline_lists_blocks_and_named_reactions() {
        let ctx = Context::new();
        let analysis =
            ctx.analyze("model m\n  J0: A -> B; k\n  A -> C; k\nend\nfunction f(x)\n  x\nend");
        let items: Vec<(String, SymbolType)> = analysis
            .outline()
            .into_iter()
            .map(|i| (i.name, i.kind))
            .collect();
        assert_eq!(
            items,
            vec![
                ("m".to_string(), SymbolType::Model),
                ("J0".to_string(), SymbolType::Reaction),
                ("f".to_string(), SymbolType::Function),
            ]
        );
    }
}
