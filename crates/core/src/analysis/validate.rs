//! Pass 2: check references, calls and compartments against the
//! completed symbol table.

use std::collections::BTreeSet;

use crate::issue::Issue;
use crate::position::Range;
use crate::scope::Scope;
use crate::symbols::{Symbol, SymbolTable, SymbolType};
use crate::tree::ast::{
    Declaration, Function, InComp, IsAssignment, Item, Parameters, Reaction, Statement,
    VarName, VariableIn,
};
use crate::tree::{NodeId, Tree};

use super::{expr_names, func_calls};

pub(super) fn validate(tree: &Tree, table: &mut SymbolTable) {
    let mut validator = Validator {
        tree,
        table,
        issues: Vec::new(),
    };
    validator.items(&Scope::Global, tree.items());
    let issues = validator.issues;
    for issue in issues {
        table.push_issue(issue);
    }
}

struct Validator<'t, 'a> {
    tree: &'t Tree,
    table: &'a SymbolTable,
    issues: Vec<Issue>,
}

/// What kind of callable a call site expects.
#[derive(Clone, Copy)]
enum Callee {
    Function,
    Module,
}

impl<'t> Validator<'t, '_> {
    fn items(&mut self, scope: &Scope, items: Vec<Item<'t>>) {
        for item in items {
            match item {
                Item::Stmt(stmt) => {
                    if let Some(stmt) = stmt.statement() {
                        self.statement(scope, stmt);
                    }
                }
                Item::Model(model) => {
                    let scope = Scope::Model(model.name().map(|v| v.text()).unwrap_or("").into());
                    if let Some(body) = model.body() {
                        self.items(&scope, body.items());
                    }
                }
                Item::ModularModel(module) => {
                    let scope =
                        Scope::Module(module.name().map(|v| v.text()).unwrap_or("").into());
                    if let Some(body) = module.body() {
                        self.items(&scope, body.items());
                    }
                }
                Item::Function(function) => self.function(function),
                Item::ErrorNode(_) | Item::ErrorToken(_) => {}
            }
        }
    }

    fn statement(&mut self, scope: &Scope, stmt: Statement<'t>) {
        match stmt {
            Statement::Declaration(s) => self.declaration(scope, s),
            Statement::VariableIn(s) => self.variable_in(scope, s),
            Statement::Reaction(s) => self.reaction(scope, s),
            Statement::ModularModelCall(call) => {
                self.call(
                    scope,
                    Callee::Module,
                    call.callee().and_then(|c| c.name()),
                    call.params(),
                    call.range(),
                );
                self.compartments(scope, call.id);
            }
            Statement::FunctionCall(call) => {
                self.call(
                    scope,
                    Callee::Function,
                    call.callee().and_then(|c| c.name()),
                    call.params(),
                    call.range(),
                );
                if let Some(params) = call.params() {
                    self.nested_calls(scope, params.id);
                }
                self.compartments(scope, call.id);
            }
            Statement::IsAssignment(s) => self.alias(scope, s),
            Statement::Assignment(s) => {
                if let Some(value) = s.value() {
                    self.nested_calls(scope, value);
                }
            }
            Statement::RateRule(s) => {
                if let Some(value) = s.value() {
                    self.nested_calls(scope, value);
                }
            }
            Statement::Annotation(_)
            | Statement::UnitDeclaration(_)
            | Statement::UnitAssignment(_) => {}
        }
    }

    fn declaration(&mut self, scope: &Scope, declaration: Declaration<'t>) {
        if let Some(modifiers) = declaration.modifiers() {
            if modifiers.sub_modifier().is_some()
                && modifiers.symbol_type() != SymbolType::Species
            {
                self.issues.push(Issue::sub_error(modifiers.range()));
            }
        }
        for item in declaration.items() {
            if let Some(comp) = item.maybein().and_then(|m| m.in_comp()) {
                self.compartment(scope, comp);
            }
            if let Some(value) = item.value() {
                self.nested_calls(scope, value);
            }
        }
    }

    fn variable_in(&mut self, scope: &Scope, stmt: VariableIn<'t>) {
        if let Some(comp) = stmt.in_comp() {
            self.compartment(scope, comp);
        }
        let Some(var) = stmt.var_name() else { return };
        let Some(name) = var.name() else { return };
        let has_value = self
            .table
            .resolve(scope, var.text())
            .is_some_and(|s| s.value_node.is_some());
        if !has_value {
            self.issues
                .push(Issue::ref_undefined(self.tree.range(name), var.text()));
        }
    }

    fn reaction(&mut self, scope: &Scope, reaction: Reaction<'t>) {
        for species in reaction.reactants().into_iter().chain(reaction.products()) {
            let Some(name) = species.name() else { continue };
            let text = species.text();
            let initialized = self
                .table
                .resolve(scope, text)
                .is_some_and(|s| s.value_node.is_some());
            if !initialized {
                self.issues
                    .push(Issue::species_undefined(self.tree.range(name), text));
            }
        }
        if let Some(rate_law) = reaction.rate_law() {
            self.nested_calls(scope, rate_law);
        }
        self.compartments(scope, reaction.id);
    }

    fn alias(&mut self, scope: &Scope, alias: IsAssignment<'t>) {
        let Some(var) = alias.var_name() else { return };
        if self.table.resolve(scope, var.text()).is_none() {
            self.issues.push(Issue::var_not_found(var.range(), var.text()));
        }
    }

    // ── compartments ────────────────────────────────

    fn compartments(&mut self, scope: &Scope, id: NodeId) {
        let comps: Vec<InComp<'t>> = self
            .tree
            .descendants(id)
            .filter_map(|d| InComp::cast(self.tree, d))
            .collect();
        for comp in comps {
            self.compartment(scope, comp);
        }
    }

    fn compartment(&mut self, scope: &Scope, comp: InComp<'t>) {
        let Some(var) = comp.comp() else { return };
        let initialized = self
            .table
            .resolve(scope, var.text())
            .is_some_and(|s| s.value_node.is_some());
        if !initialized {
            self.issues.push(Issue::uninit_compt(var.range(), var.text()));
        }
    }

    // ── calls ───────────────────────────────────────

    /// Check a call site: the callee exists, the argument count matches,
    /// and each plain-name argument has a compatible type.
    fn call(
        &mut self,
        scope: &Scope,
        kind: Callee,
        callee: Option<NodeId>,
        args: Option<Parameters<'t>>,
        site: Range,
    ) {
        let Some(callee) = callee else { return };
        let name = self.tree.text(callee);
        let expected = match kind {
            Callee::Function => SymbolType::Function,
            Callee::Module => SymbolType::ModularModel,
        };
        let table = self.table;
        let symbol: Option<&Symbol> = table
            .lookup(&Scope::Global, name)
            .filter(|s| s.typ == expected && s.is_callable());
        let Some(symbol) = symbol else {
            let range = self.tree.range(callee);
            self.issues.push(match kind {
                Callee::Function => Issue::uninit_function(range, name),
                Callee::Module => Issue::uninit_mmodel(range, name),
            });
            return;
        };

        let args = args.map(|a| a.items()).unwrap_or_default();
        let params = symbol.params();
        if args.len() != params.len() {
            self.issues
                .push(Issue::incorrect_param_num(site, params.len(), args.len()));
            return;
        }
        for (arg, param) in args.into_iter().zip(params) {
            let Some(arg_name) = self.plain_name(arg) else { continue };
            let Some(given) = table.resolve(scope, self.tree.text(arg_name)) else {
                continue;
            };
            if !given.typ.derives_from(param.typ) {
                self.issues.push(Issue::param_incorrect_type(
                    self.tree.range(arg),
                    param.typ,
                    given.typ,
                ));
            }
        }
    }

    /// The `Name` leaf of an argument that is a bare variable reference.
    fn plain_name(&self, arg: NodeId) -> Option<NodeId> {
        VarName::cast(self.tree, arg).and_then(|v| v.name())
    }

    /// Validate every function call inside an expression.
    fn nested_calls(&mut self, scope: &Scope, expr: NodeId) {
        for call in func_calls(self.tree, expr) {
            self.call(
                scope,
                Callee::Function,
                call.callee().and_then(|c| c.name()),
                call.params(),
                call.range(),
            );
        }
    }

    // ── function bodies ─────────────────────────────

    /// A function body may only mention its own parameters.
    fn function(&mut self, function: Function<'t>) {
        let name = function.name().map(|v| v.text()).unwrap_or("");
        let scope = Scope::Function(name.to_string());
        let params = function.params().map(|p| p.names()).unwrap_or_default();
        let declared: BTreeSet<&str> = params.iter().map(|p| p.text()).collect();

        let mut used = BTreeSet::new();
        if let Some(expr) = function.expr() {
            for leaf in expr_names(self.tree, expr) {
                let text = self.tree.text(leaf);
                if declared.contains(text) {
                    used.insert(text);
                } else {
                    self.issues
                        .push(Issue::ref_undefined(self.tree.range(leaf), text));
                }
            }
            self.nested_calls(&scope, expr);
        }
        for param in &params {
            if !used.contains(param.text()) {
                self.issues
                    .push(Issue::unused_parameter(param.range(), param.text()));
            }
        }
    }
}
