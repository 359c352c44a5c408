//! Pass 1: collect declarations into the symbol table.

use crate::scope::Scope;
use crate::symbols::{Flags, QName, Symbol, SymbolTable, SymbolType};
use crate::tree::ast::{
    Annotation, Assignment, Declaration, Function, FunctionCall, InComp, IsAssignment, Item,
    ModularModel, ModularModelCall, Model, Parameters, RateRule, Reaction, Statement,
    UnitAssignment, UnitDeclaration, VarName, VariableIn,
};
use crate::tree::{NodeId, Tree};

use super::expr_names;

/// Statements resolved only after every declaration is known.
#[derive(Default)]
pub(super) struct Pending<'t> {
    pub annotations: Vec<(Scope, Annotation<'t>)>,
    pub aliases: Vec<(Scope, IsAssignment<'t>)>,
    pub rate_rules: Vec<(Scope, RateRule<'t>)>,
}

pub(super) fn collect<'t>(tree: &'t Tree, table: &mut SymbolTable) -> Pending<'t> {
    let mut collector = Collector {
        tree,
        table,
        pending: Pending::default(),
    };
    collector.items(&Scope::Global, tree.items());
    collector.pending
}

struct Collector<'t, 'a> {
    tree: &'t Tree,
    table: &'a mut SymbolTable,
    pending: Pending<'t>,
}

impl<'t> Collector<'t, '_> {
    fn items(&mut self, scope: &Scope, items: Vec<Item<'t>>) {
        for item in items {
            match item {
                Item::Stmt(stmt) => {
                    if let Some(stmt) = stmt.statement() {
                        self.statement(scope, stmt);
                        self.compartments(scope, stmt.id());
                    }
                }
                Item::Model(model) => self.model(model),
                Item::ModularModel(module) => self.modular_model(module),
                Item::Function(function) => self.function(function),
                // recovery markers carry no declarations
                Item::ErrorNode(_) | Item::ErrorToken(_) => {}
            }
        }
    }

    fn statement(&mut self, scope: &Scope, stmt: Statement<'t>) {
        match stmt {
            Statement::Reaction(s) => self.reaction(scope, s),
            Statement::Assignment(s) => self.assignment(scope, s),
            Statement::Declaration(s) => self.declaration(scope, s),
            Statement::UnitDeclaration(s) => self.unit_declaration(scope, s),
            Statement::UnitAssignment(s) => self.unit_assignment(scope, s),
            Statement::ModularModelCall(s) => self.modular_model_call(scope, s),
            Statement::FunctionCall(s) => self.function_call(scope, s),
            Statement::VariableIn(s) => self.variable_in(scope, s),
            Statement::Annotation(s) => self.pending.annotations.push((scope.clone(), s)),
            Statement::IsAssignment(s) => self.pending.aliases.push((scope.clone(), s)),
            Statement::RateRule(s) => self.pending.rate_rules.push((scope.clone(), s)),
        }
    }

    fn insert(
        &mut self,
        scope: &Scope,
        name: NodeId,
        typ: SymbolType,
        decl: Option<NodeId>,
        value: Option<NodeId>,
        flags: Flags,
    ) {
        let qname = QName::new(scope.clone(), name);
        self.table.insert(self.tree, &qname, typ, decl, value, flags);
    }

    /// Every name an expression mentions becomes at least a parameter.
    fn expression(&mut self, scope: &Scope, expr: Option<NodeId>) {
        let Some(expr) = expr else { return };
        for name in expr_names(self.tree, expr) {
            self.insert(scope, name, SymbolType::Parameter, None, None, Flags::default());
        }
    }

    fn arguments(&mut self, scope: &Scope, params: Option<Parameters<'t>>) {
        if let Some(params) = params {
            self.expression(scope, Some(params.id));
        }
    }

    // ── statements ──────────────────────────────────

    fn reaction(&mut self, scope: &Scope, reaction: Reaction<'t>) {
        if let Some(name) = reaction.reaction_name().and_then(|n| n.name()) {
            self.insert(
                scope,
                name,
                SymbolType::Reaction,
                Some(reaction.id),
                None,
                Flags::default(),
            );
        }

        let compartment = reaction
            .in_comp()
            .or_else(|| {
                reaction
                    .reaction_name()
                    .and_then(|n| n.maybein())
                    .and_then(|m| m.in_comp())
            })
            .and_then(|c| c.comp())
            .map(|c| c.text().to_string());

        for species in reaction.reactants().into_iter().chain(reaction.products()) {
            let Some(name) = species.name() else { continue };
            let flags = Flags {
                is_const: Some(species.is_const()),
                compartment: compartment.clone(),
                in_reaction: true,
                ..Flags::default()
            };
            self.insert(scope, name, SymbolType::Species, None, None, flags);
        }

        self.expression(scope, reaction.rate_law());
    }

    fn assignment(&mut self, scope: &Scope, assignment: Assignment<'t>) {
        let Some(maybein) = assignment.maybein() else { return };
        if let Some(name) = maybein.name() {
            let flags = Flags {
                is_const: maybein.var_name().filter(|v| v.is_const()).map(|_| true),
                compartment: maybein
                    .in_comp()
                    .and_then(|c| c.comp())
                    .map(|c| c.text().to_string()),
                ..Flags::default()
            };
            self.insert(
                scope,
                name,
                SymbolType::Parameter,
                None,
                Some(assignment.id),
                flags,
            );
        }
        self.expression(scope, assignment.value());
    }

    fn declaration(&mut self, scope: &Scope, declaration: Declaration<'t>) {
        let Some(modifiers) = declaration.modifiers() else { return };
        let typ = modifiers.symbol_type();
        for item in declaration.items() {
            let Some(maybein) = item.maybein() else { continue };
            let Some(name) = maybein.name() else { continue };
            let value = item.value();
            let flags = Flags {
                is_const: modifiers.constness(),
                compartment: maybein
                    .in_comp()
                    .and_then(|c| c.comp())
                    .map(|c| c.text().to_string()),
                substance_only: modifiers.sub_modifier().is_some(),
                ..Flags::default()
            };
            self.insert(
                scope,
                name,
                typ,
                Some(declaration.id),
                value.map(|_| item.id),
                flags,
            );
            self.expression(scope, value);
        }
    }

    fn unit_declaration(&mut self, scope: &Scope, unit: UnitDeclaration<'t>) {
        if let Some(name) = unit.var_name().and_then(|v| v.name()) {
            self.insert(
                scope,
                name,
                SymbolType::Unit,
                Some(unit.id),
                unit.value().map(|_| unit.id),
                Flags::default(),
            );
        }
    }

    fn unit_assignment(&mut self, scope: &Scope, assignment: UnitAssignment<'t>) {
        let Some(var) = assignment.var_name() else { return };
        let Some(name) = var.name() else { return };
        self.insert(scope, name, SymbolType::Variable, None, None, Flags::default());
        let unit = assignment.unit().map(|u| self.tree.flat_text(u));
        if let Some(sym) = self.table.lookup_mut(scope, var.text()) {
            sym.unit = unit;
        }
    }

    fn modular_model_call(&mut self, scope: &Scope, call: ModularModelCall<'t>) {
        if let Some(name) = call.reaction_name().and_then(|n| n.name()) {
            self.insert(
                scope,
                name,
                SymbolType::Submodel,
                Some(call.id),
                None,
                Flags::default(),
            );
        }
        self.arguments(scope, call.params());
    }

    fn function_call(&mut self, scope: &Scope, call: FunctionCall<'t>) {
        if let Some(name) = call.maybein().and_then(|m| m.name()) {
            self.insert(
                scope,
                name,
                SymbolType::Parameter,
                None,
                Some(call.id),
                Flags::default(),
            );
        }
        self.arguments(scope, call.params());
    }

    fn variable_in(&mut self, scope: &Scope, stmt: VariableIn<'t>) {
        let Some(name) = stmt.var_name().and_then(|v| v.name()) else { return };
        let flags = Flags {
            compartment: stmt
                .in_comp()
                .and_then(|c| c.comp())
                .map(|c| c.text().to_string()),
            ..Flags::default()
        };
        self.insert(scope, name, SymbolType::Variable, Some(stmt.id), None, flags);
    }

    /// Register every compartment named by an `in` clause under `id`.
    fn compartments(&mut self, scope: &Scope, id: NodeId) {
        let names: Vec<NodeId> = self
            .tree
            .descendants(id)
            .filter_map(|d| InComp::cast(self.tree, d))
            .filter_map(|c| c.comp().and_then(|v| v.name()))
            .collect();
        for name in names {
            self.insert(scope, name, SymbolType::Compartment, None, None, Flags::default());
        }
    }

    // ── blocks ──────────────────────────────────────

    fn model(&mut self, model: Model<'t>) {
        let Some(var) = model.name() else { return };
        let Some(name) = var.name() else { return };
        self.insert(
            &Scope::Global,
            name,
            SymbolType::Model,
            Some(model.id),
            None,
            Flags::default(),
        );
        let scope = Scope::Model(var.text().to_string());
        if let Some(body) = model.body() {
            self.items(&scope, body.items());
        }
    }

    fn modular_model(&mut self, module: ModularModel<'t>) {
        let Some(var) = module.name() else { return };
        let Some(name) = var.name() else { return };
        let scope = Scope::Module(var.text().to_string());

        let params = module.params().map(|p| p.names()).unwrap_or_default();
        for param in &params {
            if let Some(leaf) = param.name() {
                self.insert(&scope, leaf, SymbolType::Variable, None, None, Flags::default());
            }
        }
        if let Some(body) = module.body() {
            self.items(&scope, body.items());
        }

        // parameter types are whatever the body narrowed them to
        let symbols = self.parameter_symbols(&scope, &params);
        self.table.insert_mmodel(self.tree, name, symbols, module.id);
    }

    fn function(&mut self, function: Function<'t>) {
        let Some(var) = function.name() else { return };
        let Some(name) = var.name() else { return };
        let scope = Scope::Function(var.text().to_string());

        let params = function.params().map(|p| p.names()).unwrap_or_default();
        for param in &params {
            if let Some(leaf) = param.name() {
                self.insert(&scope, leaf, SymbolType::Parameter, None, None, Flags::default());
            }
        }
        let symbols = self.parameter_symbols(&scope, &params);
        self.table.insert_function(self.tree, name, symbols, function.id);
    }

    fn parameter_symbols(
        &self,
        scope: &Scope,
        params: &[VarName<'t>],
    ) -> Vec<Symbol> {
        params
            .iter()
            .filter_map(|p| {
                let leaf = p.name()?;
                Some(
                    self.table
                        .lookup(scope, p.text())
                        .cloned()
                        .unwrap_or_else(|| Symbol::new(p.text(), SymbolType::Variable, leaf)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::issue::IssueKind;
    use crate::position::Position;
    use crate::scope::Scope;
    use crate::symbols::SymbolType;

    #[test]
    fn model_body_gets_its_own_scope() {
        let ctx = Context::new();
        let analysis = ctx.analyze("model m\n  S1 -> S2; k1*S1\n  k1 = 0.1\nend\nk1 = 3");
        let table = analysis.table();
        let m = Scope::Model("m".into());
        assert_eq!(table.lookup(&Scope::Global, "m").map(|s| s.typ), Some(SymbolType::Model));
        assert_eq!(table.lookup(&m, "S1").map(|s| s.typ), Some(SymbolType::Species));
        assert!(table.lookup(&m, "k1").and_then(|s| s.value_node).is_some());
        // the global k1 is a different symbol: no override warnings
        assert!(analysis
            .issues()
            .iter()
            .all(|i| i.kind != IssueKind::ObscuredValue));
    }

    #[test]
    fn reaction_records_species_flags() {
        let ctx = Context::new();
        let analysis = ctx.analyze("J0: $A -> B; k in cell");
        let table = analysis.table();
        let a = table.lookup(&Scope::Global, "A").expect("A");
        assert!(a.is_const && a.in_reaction);
        assert_eq!(a.compartment.as_deref(), Some("cell"));
        let b = table.lookup(&Scope::Global, "B").expect("B");
        assert!(!b.is_const);
        assert_eq!(
            table.lookup(&Scope::Global, "cell").map(|s| s.typ),
            Some(SymbolType::Compartment)
        );
    }

    #[test]
    fn declaration_sets_type_value_and_modifiers() {
        let ctx = Context::new();
        let analysis = ctx.analyze("const species a = 1, b\nsubstanceOnly species c");
        let table = analysis.table();
        let a = table.lookup(&Scope::Global, "a").expect("a");
        assert_eq!(a.typ, SymbolType::Species);
        assert!(a.is_const);
        assert!(a.value_node.is_some());
        let b = table.lookup(&Scope::Global, "b").expect("b");
        assert!(b.value_node.is_none() && b.decl_node.is_some());
        assert!(table.lookup(&Scope::Global, "c").expect("c").is_substance_only);
    }

    #[test]
    fn obscured_value_pair() {
        let ctx = Context::new();
        let analysis = ctx.analyze("x = 1; x = 2;");
        let kinds: Vec<IssueKind> = analysis.issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::ObscuredValue, IssueKind::OverrodeValue]);
        let issues = analysis.issues();
        assert_eq!(issues[0].range.start.column, 1);
        assert_eq!(issues[1].range.start.column, 8);
    }

    #[test]
    fn second_compartment_placement_warns_at_both_sites() {
        let ctx = Context::new();
        let analysis =
            ctx.analyze("compartment c = 1\ncompartment d = 1\nx = 1\nx in c\nx in d");
        let issues = analysis.issues();
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::ObscuredValueCompartment,
                IssueKind::ObscuredValueCompartment
            ]
        );
        assert_eq!(issues[0].range.start, Position::new(4, 1));
        assert_eq!(issues[1].range.start, Position::new(5, 1));
        assert!(issues[0].message.contains("5:1"), "{}", issues[0].message);
        assert!(issues[1].message.contains("4:1"), "{}", issues[1].message);
    }

    #[test]
    fn repeated_submodel_obscures_then_overrides() {
        let ctx = Context::new();
        let analysis = ctx.analyze("model *m()\n  x = 1\nend\nA: m()\nA: m()");
        let issues = analysis.issues();
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::ObscuredValue, IssueKind::OverrodeValue]);
        assert_eq!(issues[0].range.start, Position::new(4, 1));
        assert_eq!(issues[1].range.start, Position::new(5, 1));
        assert_ne!(issues[0].range, issues[1].range);
    }

    #[test]
    fn repeated_plain_declaration_is_silent() {
        let ctx = Context::new();
        let analysis = ctx.analyze("species a\nspecies a\na = 1");
        assert!(analysis.issues().is_empty(), "{:?}", analysis.issues());
        let a = analysis.table().lookup(&Scope::Global, "a").expect("a");
        assert_eq!(a.decl_node.map(|d| analysis.tree().range(d).start.line), Some(2));
    }

    #[test]
    fn sibling_types_conflict_at_both_sites() {
        let ctx = Context::new();
        let analysis = ctx.analyze("species a\ncompartment a");
        let issues = analysis.issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::IncompatibleType));
        assert_ne!(issues[0].range, issues[1].range);
    }

    #[test]
    fn module_parameters_take_body_types() {
        let ctx = Context::new();
        let analysis = ctx.analyze("model *m(S, k)\n  S -> ; k*S\n  S = 1\n  k = 1\nend");
        let m = analysis.table().lookup(&Scope::Global, "m").expect("m");
        assert_eq!(m.typ, SymbolType::ModularModel);
        let types: Vec<SymbolType> = m.params().iter().map(|p| p.typ).collect();
        assert_eq!(types, vec![SymbolType::Species, SymbolType::Parameter]);
        assert!(analysis
            .table()
            .lookup(&Scope::Module("m".into()), "m")
            .is_some());
    }

    #[test]
    fn function_is_mirrored_into_its_scope() {
        let ctx = Context::new();
        let analysis = ctx.analyze("function f(x, y)\n  x + y\nend");
        let table = analysis.table();
        let global = table.lookup(&Scope::Global, "f").expect("global f");
        assert_eq!(global.params().len(), 2);
        let own = table.lookup(&Scope::Function("f".into()), "f").expect("own f");
        assert_eq!(own.typ, SymbolType::Function);
        assert!(analysis.issues().is_empty());
    }

    #[test]
    fn unit_assignment_records_unit() {
        let ctx = Context::new();
        let analysis = ctx.analyze("unit conc = mole / liter\nx = 2\nx has conc");
        let table = analysis.table();
        assert_eq!(
            table.lookup(&Scope::Global, "conc").map(|s| s.typ),
            Some(SymbolType::Unit)
        );
        let x = table.lookup(&Scope::Global, "x").expect("x");
        assert_eq!(x.typ, SymbolType::Parameter);
        assert_eq!(x.unit.as_deref(), Some("conc"));
    }
}
