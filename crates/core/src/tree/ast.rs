//! Typed views over tree nodes.
//!
//! A view is a `(tree, id)` pair checked against one [`NodeKind`]; its
//! accessors read fixed child slots, so absent optional symbols come back
//! as `None` instead of shifting later children.

use crate::position::Range;
use crate::symbols::SymbolType;

use super::{NodeId, NodeKind, Tree};

macro_rules! views {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name<'t> {
                pub tree: &'t Tree,
                pub id: NodeId,
            }

            impl<'t> $name<'t> {
                pub fn cast(tree: &'t Tree, id: NodeId) -> Option<Self> {
                    (tree.kind(id) == NodeKind::$name).then_some($name { tree, id })
                }

                pub fn range(&self) -> Range {
                    self.tree.range(self.id)
                }

                #[allow(dead_code)]
                fn slot(&self, index: usize) -> Option<NodeId> {
                    self.tree.child(self.id, index)
                }

                #[allow(dead_code)]
                fn view<V>(&self, index: usize, cast: fn(&'t Tree, NodeId) -> Option<V>) -> Option<V> {
                    self.slot(index).and_then(|c| cast(self.tree, c))
                }
            }
        )*
    };
}

views! {
    /// `$`? name
    VarName;
    InComp;
    NameMaybeIn;
    Species;
    SpeciesList;
    ReactionName;
    Reaction;
    Assignment;
    RateRule;
    DeclModifiers;
    DeclAssignment;
    DeclItem;
    Declaration;
    Annotation;
    UnitDeclaration;
    UnitAssignment;
    VariableIn;
    IsAssignment;
    ModularModelCall;
    FunctionCall;
    FuncCall;
    Parameters;
    SimpleStmt;
    SimpleStmtList;
    Model;
    ModularModel;
    Function;
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

impl<'t> VarName<'t> {
    /// The `Name` leaf.
    pub fn name(&self) -> Option<NodeId> {
        self.slot(1)
    }

    pub fn text(&self) -> &'t str {
        self.name().map(|n| self.tree.text(n)).unwrap_or("")
    }

    /// Prefixed with `$`.
    pub fn is_const(&self) -> bool {
        self.slot(0).is_some()
    }
}

impl<'t> InComp<'t> {
    pub fn comp(&self) -> Option<VarName<'t>> {
        self.view(1, VarName::cast)
    }
}

impl<'t> NameMaybeIn<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn in_comp(&self) -> Option<InComp<'t>> {
        self.view(1, InComp::cast)
    }

    pub fn name(&self) -> Option<NodeId> {
        self.var_name().and_then(|v| v.name())
    }

    pub fn text(&self) -> &'t str {
        self.var_name().map(|v| v.text()).unwrap_or("")
    }
}

impl<'t> Species<'t> {
    /// Stoichiometry; 1 when omitted.
    pub fn stoich(&self) -> f64 {
        self.slot(0)
            .and_then(|n| self.tree.text(n).parse().ok())
            .unwrap_or(1.0)
    }

    pub fn is_const(&self) -> bool {
        self.slot(1).is_some()
    }

    pub fn name(&self) -> Option<NodeId> {
        self.slot(2)
    }

    pub fn text(&self) -> &'t str {
        self.name().map(|n| self.tree.text(n)).unwrap_or("")
    }
}

impl<'t> SpeciesList<'t> {
    pub fn species(&self) -> Vec<Species<'t>> {
        self.tree
            .children(self.id)
            .filter_map(|c| Species::cast(self.tree, c))
            .collect()
    }
}

impl<'t> ReactionName<'t> {
    pub fn maybein(&self) -> Option<NameMaybeIn<'t>> {
        self.view(0, NameMaybeIn::cast)
    }

    pub fn name(&self) -> Option<NodeId> {
        self.maybein().and_then(|m| m.name())
    }

    pub fn text(&self) -> &'t str {
        self.maybein().map(|m| m.text()).unwrap_or("")
    }
}

impl<'t> Reaction<'t> {
    pub fn reaction_name(&self) -> Option<ReactionName<'t>> {
        self.view(0, ReactionName::cast)
    }

    pub fn reactant_list(&self) -> Option<SpeciesList<'t>> {
        self.view(1, SpeciesList::cast)
    }

    pub fn product_list(&self) -> Option<SpeciesList<'t>> {
        self.view(3, SpeciesList::cast)
    }

    pub fn reactants(&self) -> Vec<Species<'t>> {
        self.reactant_list().map(|l| l.species()).unwrap_or_default()
    }

    pub fn products(&self) -> Vec<Species<'t>> {
        self.product_list().map(|l| l.species()).unwrap_or_default()
    }

    pub fn arrow(&self) -> Option<NodeId> {
        self.slot(2)
    }

    /// `=>` rather than `->`.
    pub fn is_reversible(&self) -> bool {
        self.arrow().is_some_and(|a| self.tree.text(a) == "=>")
    }

    pub fn rate_law(&self) -> Option<NodeId> {
        self.slot(5)
    }

    pub fn in_comp(&self) -> Option<InComp<'t>> {
        self.view(6, InComp::cast)
    }
}

impl<'t> Assignment<'t> {
    pub fn maybein(&self) -> Option<NameMaybeIn<'t>> {
        self.view(0, NameMaybeIn::cast)
    }

    pub fn value(&self) -> Option<NodeId> {
        self.slot(2)
    }
}

impl<'t> RateRule<'t> {
    pub fn name(&self) -> Option<NodeId> {
        self.slot(0)
    }

    pub fn text(&self) -> &'t str {
        self.name().map(|n| self.tree.text(n)).unwrap_or("")
    }

    pub fn value(&self) -> Option<NodeId> {
        self.slot(3)
    }
}

impl<'t> DeclModifiers<'t> {
    pub fn var_modifier(&self) -> Option<NodeId> {
        self.slot(0)
    }

    pub fn sub_modifier(&self) -> Option<NodeId> {
        self.slot(1)
    }

    pub fn type_modifier(&self) -> Option<NodeId> {
        self.slot(2)
    }

    /// `Some(true)` for `const`, `Some(false)` for `var`.
    pub fn constness(&self) -> Option<bool> {
        self.var_modifier().map(|m| self.tree.text(m) == "const")
    }

    pub fn symbol_type(&self) -> SymbolType {
        match self.type_modifier().map(|m| self.tree.text(m)) {
            Some("species") => SymbolType::Species,
            Some("compartment") => SymbolType::Compartment,
            Some("formula") => SymbolType::Parameter,
            _ => SymbolType::Variable,
        }
    }
}

impl<'t> DeclAssignment<'t> {
    pub fn value(&self) -> Option<NodeId> {
        self.slot(1)
    }
}

impl<'t> DeclItem<'t> {
    pub fn maybein(&self) -> Option<NameMaybeIn<'t>> {
        self.view(0, NameMaybeIn::cast)
    }

    pub fn decl_assignment(&self) -> Option<DeclAssignment<'t>> {
        self.view(1, DeclAssignment::cast)
    }

    pub fn value(&self) -> Option<NodeId> {
        self.decl_assignment().and_then(|d| d.value())
    }
}

impl<'t> Declaration<'t> {
    pub fn modifiers(&self) -> Option<DeclModifiers<'t>> {
        self.view(0, DeclModifiers::cast)
    }

    pub fn items(&self) -> Vec<DeclItem<'t>> {
        self.tree
            .children(self.id)
            .filter_map(|c| DeclItem::cast(self.tree, c))
            .collect()
    }
}

impl<'t> Annotation<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn keyword(&self) -> &'t str {
        self.slot(1).map(|k| self.tree.text(k)).unwrap_or("")
    }

    /// The URI without its quotes.
    pub fn uri(&self) -> &'t str {
        self.slot(2).map(|s| unquote(self.tree.text(s))).unwrap_or("")
    }
}

impl<'t> UnitDeclaration<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(1, VarName::cast)
    }

    pub fn value(&self) -> Option<NodeId> {
        self.slot(3)
    }
}

impl<'t> UnitAssignment<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn unit(&self) -> Option<NodeId> {
        self.slot(2)
    }
}

impl<'t> VariableIn<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn in_comp(&self) -> Option<InComp<'t>> {
        self.view(1, InComp::cast)
    }
}

impl<'t> IsAssignment<'t> {
    pub fn var_name(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn display_name(&self) -> &'t str {
        self.slot(2).map(|s| unquote(self.tree.text(s))).unwrap_or("")
    }
}

impl<'t> Parameters<'t> {
    /// Argument expressions, separators skipped.
    pub fn items(&self) -> Vec<NodeId> {
        self.tree.children(self.id).step_by(2).collect()
    }

    /// Items that are plain names, as in a parameter list of a definition.
    pub fn names(&self) -> Vec<VarName<'t>> {
        self.items()
            .into_iter()
            .filter_map(|c| VarName::cast(self.tree, c))
            .collect()
    }
}

impl<'t> ModularModelCall<'t> {
    pub fn reaction_name(&self) -> Option<ReactionName<'t>> {
        self.view(0, ReactionName::cast)
    }

    pub fn callee(&self) -> Option<VarName<'t>> {
        self.view(1, VarName::cast)
    }

    pub fn params(&self) -> Option<Parameters<'t>> {
        self.view(3, Parameters::cast)
    }
}

impl<'t> FunctionCall<'t> {
    pub fn maybein(&self) -> Option<NameMaybeIn<'t>> {
        self.view(0, NameMaybeIn::cast)
    }

    pub fn callee(&self) -> Option<VarName<'t>> {
        self.view(2, VarName::cast)
    }

    pub fn params(&self) -> Option<Parameters<'t>> {
        self.view(4, Parameters::cast)
    }
}

impl<'t> FuncCall<'t> {
    pub fn callee(&self) -> Option<VarName<'t>> {
        self.view(0, VarName::cast)
    }

    pub fn params(&self) -> Option<Parameters<'t>> {
        self.view(2, Parameters::cast)
    }
}

impl<'t> SimpleStmt<'t> {
    pub fn statement(&self) -> Option<Statement<'t>> {
        self.slot(0).and_then(|s| Statement::cast(self.tree, s))
    }
}

impl<'t> SimpleStmtList<'t> {
    /// Statements and stray error markers in order.
    pub fn items(&self) -> Vec<Item<'t>> {
        self.tree
            .children(self.id)
            .filter_map(|c| Item::cast(self.tree, c))
            .collect()
    }
}

impl<'t> Model<'t> {
    pub fn name(&self) -> Option<VarName<'t>> {
        self.view(1, VarName::cast)
    }

    pub fn body(&self) -> Option<SimpleStmtList<'t>> {
        self.view(2, SimpleStmtList::cast)
    }
}

impl<'t> ModularModel<'t> {
    pub fn name(&self) -> Option<VarName<'t>> {
        self.view(2, VarName::cast)
    }

    pub fn params(&self) -> Option<Parameters<'t>> {
        self.view(4, Parameters::cast)
    }

    pub fn body(&self) -> Option<SimpleStmtList<'t>> {
        self.view(6, SimpleStmtList::cast)
    }
}

impl<'t> Function<'t> {
    pub fn name(&self) -> Option<VarName<'t>> {
        self.view(1, VarName::cast)
    }

    pub fn params(&self) -> Option<Parameters<'t>> {
        self.view(3, Parameters::cast)
    }

    pub fn expr(&self) -> Option<NodeId> {
        self.slot(6)
    }
}

// ──────────────────────────────────────────────
// Closed sums
// ──────────────────────────────────────────────

/// Every statement form that can appear inside a `SimpleStmt`.
#[derive(Debug, Clone, Copy)]
pub enum Statement<'t> {
    Reaction(Reaction<'t>),
    Assignment(Assignment<'t>),
    RateRule(RateRule<'t>),
    Declaration(Declaration<'t>),
    Annotation(Annotation<'t>),
    UnitDeclaration(UnitDeclaration<'t>),
    UnitAssignment(UnitAssignment<'t>),
    ModularModelCall(ModularModelCall<'t>),
    FunctionCall(FunctionCall<'t>),
    VariableIn(VariableIn<'t>),
    IsAssignment(IsAssignment<'t>),
}

impl<'t> Statement<'t> {
    pub fn cast(tree: &'t Tree, id: NodeId) -> Option<Self> {
        let stmt = match tree.kind(id) {
            NodeKind::Reaction => Statement::Reaction(Reaction { tree, id }),
            NodeKind::Assignment => Statement::Assignment(Assignment { tree, id }),
            NodeKind::RateRule => Statement::RateRule(RateRule { tree, id }),
            NodeKind::Declaration => Statement::Declaration(Declaration { tree, id }),
            NodeKind::Annotation => Statement::Annotation(Annotation { tree, id }),
            NodeKind::UnitDeclaration => Statement::UnitDeclaration(UnitDeclaration { tree, id }),
            NodeKind::UnitAssignment => Statement::UnitAssignment(UnitAssignment { tree, id }),
            NodeKind::ModularModelCall => {
                Statement::ModularModelCall(ModularModelCall { tree, id })
            }
            NodeKind::FunctionCall => Statement::FunctionCall(FunctionCall { tree, id }),
            NodeKind::VariableIn => Statement::VariableIn(VariableIn { tree, id }),
            NodeKind::IsAssignment => Statement::IsAssignment(IsAssignment { tree, id }),
            _ => return None,
        };
        Some(stmt)
    }

    pub fn id(&self) -> NodeId {
        match self {
            Statement::Reaction(s) => s.id,
            Statement::Assignment(s) => s.id,
            Statement::RateRule(s) => s.id,
            Statement::Declaration(s) => s.id,
            Statement::Annotation(s) => s.id,
            Statement::UnitDeclaration(s) => s.id,
            Statement::UnitAssignment(s) => s.id,
            Statement::ModularModelCall(s) => s.id,
            Statement::FunctionCall(s) => s.id,
            Statement::VariableIn(s) => s.id,
            Statement::IsAssignment(s) => s.id,
        }
    }
}

/// A child of a statement container: the file, a model body or a module
/// body.
#[derive(Debug, Clone, Copy)]
pub enum Item<'t> {
    Stmt(SimpleStmt<'t>),
    Model(Model<'t>),
    ModularModel(ModularModel<'t>),
    Function(Function<'t>),
    ErrorNode(NodeId),
    ErrorToken(NodeId),
}

impl<'t> Item<'t> {
    pub fn cast(tree: &'t Tree, id: NodeId) -> Option<Self> {
        let item = match tree.kind(id) {
            NodeKind::SimpleStmt => Item::Stmt(SimpleStmt { tree, id }),
            NodeKind::Model => Item::Model(Model { tree, id }),
            NodeKind::ModularModel => Item::ModularModel(ModularModel { tree, id }),
            NodeKind::Function => Item::Function(Function { tree, id }),
            NodeKind::ErrorNode => Item::ErrorNode(id),
            NodeKind::ErrorToken => Item::ErrorToken(id),
            _ => return None,
        };
        Some(item)
    }
}

impl Tree {
    /// Top-level items of the file.
    pub fn items(&self) -> Vec<Item<'_>> {
        self.children(self.root())
            .filter_map(|c| Item::cast(self, c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn first_statement(tree: &Tree) -> Statement<'_> {
        match tree.items().first() {
            Some(Item::Stmt(s)) => s.statement().expect("statement"),
            other => panic!("expected a statement, got {:?}", other),
        }
    }

    #[test]
    fn reaction_accessors() {
        let ctx = Context::new();
        let tree = ctx.parse("J0: 2C + $B => 2.5D; k*C in comp");
        let Statement::Reaction(r) = first_statement(&tree) else {
            panic!("not a reaction");
        };
        assert_eq!(r.reaction_name().map(|n| n.text()), Some("J0"));
        let reactants = r.reactants();
        assert_eq!(reactants.len(), 2);
        assert_eq!(reactants[0].stoich(), 2.0);
        assert_eq!(reactants[1].text(), "B");
        assert!(reactants[1].is_const());
        assert_eq!(r.products()[0].stoich(), 2.5);
        assert!(r.is_reversible());
        assert_eq!(
            r.in_comp().and_then(|c| c.comp()).map(|v| v.text()),
            Some("comp")
        );
    }

    #[test]
    fn reaction_without_reactants_keeps_slots() {
        let ctx = Context::new();
        let tree = ctx.parse("-> X; k0");
        let Statement::Reaction(r) = first_statement(&tree) else {
            panic!("not a reaction");
        };
        assert!(r.reaction_name().is_none());
        assert!(r.reactant_list().is_none());
        assert_eq!(r.products()[0].text(), "X");
        assert!(r.rate_law().is_some());
    }

    #[test]
    fn declaration_items_and_modifiers() {
        let ctx = Context::new();
        let tree = ctx.parse("const species a = 1, b in c");
        let Statement::Declaration(d) = first_statement(&tree) else {
            panic!("not a declaration");
        };
        let mods = d.modifiers().expect("modifiers");
        assert_eq!(mods.constness(), Some(true));
        assert_eq!(mods.symbol_type(), SymbolType::Species);
        let items = d.items();
        assert_eq!(items.len(), 2);
        assert!(items[0].value().is_some());
        assert!(items[1].value().is_none());
        assert!(items[1].maybein().and_then(|m| m.in_comp()).is_some());
    }

    #[test]
    fn strings_are_unquoted() {
        let ctx = Context::new();
        let tree = ctx.parse("a identity \"http://x\"\nb is \"Bee\"");
        let items = tree.items();
        let Some(Item::Stmt(first)) = items.first() else {
            panic!("missing statement");
        };
        let Some(Statement::Annotation(a)) = first.statement() else {
            panic!("not an annotation");
        };
        assert_eq!(a.keyword(), "identity");
        assert_eq!(a.uri(), "http://x");
        let Some(Item::Stmt(second)) = items.get(1) else {
            panic!("missing statement");
        };
        let Some(Statement::IsAssignment(is)) = second.statement() else {
            panic!("not an is-assignment");
        };
        assert_eq!(is.display_name(), "Bee");
    }

    #[test]
    fn function_definition_parts() {
        let ctx = Context::new();
        let tree = ctx.parse("function f(x, y)\n  x + y\nend");
        let Some(Item::Function(f)) = tree.items().first().copied() else {
            panic!("not a function");
        };
        assert_eq!(f.name().map(|n| n.text()), Some("f"));
        let names: Vec<&str> = f
            .params()
            .map(|p| p.names().iter().map(|v| v.text()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["x", "y"]);
        assert!(f.expr().is_some());
    }
}
