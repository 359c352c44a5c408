//! Symbol records, the type lattice, and the scoped symbol table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::issue::Issue;
use crate::position::Range;
use crate::scope::Scope;
use crate::tree::{NodeId, NodeKind, Tree};

// ──────────────────────────────────────────────
// Type lattice
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Unknown,
    Variable,
    Submodel,
    Model,
    Function,
    Unit,
    #[serde(rename = "mmodel")]
    ModularModel,
    Parameter,
    Species,
    Compartment,
    Reaction,
    Event,
    Constraint,
}

impl SymbolType {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolType::Unknown => "unknown",
            SymbolType::Variable => "variable",
            SymbolType::Submodel => "submodel",
            SymbolType::Model => "model",
            SymbolType::Function => "function",
            SymbolType::Unit => "unit",
            SymbolType::ModularModel => "mmodel",
            SymbolType::Parameter => "parameter",
            SymbolType::Species => "species",
            SymbolType::Compartment => "compartment",
            SymbolType::Reaction => "reaction",
            SymbolType::Event => "event",
            SymbolType::Constraint => "constraint",
        }
    }

    /// Species, compartments, reactions and constraints: mutually
    /// incomparable, all below `Parameter`.
    fn is_parameter_like(self) -> bool {
        matches!(
            self,
            SymbolType::Species
                | SymbolType::Compartment
                | SymbolType::Reaction
                | SymbolType::Constraint
        )
    }

    /// Whether `self` is `other` or strictly narrower.
    pub fn derives_from(self, other: SymbolType) -> bool {
        if self == other || other == SymbolType::Unknown {
            return true;
        }
        match other {
            SymbolType::Variable => self == SymbolType::Parameter || self.is_parameter_like(),
            SymbolType::Parameter => self.is_parameter_like(),
            _ => false,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Symbols
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: SymbolType,
    /// Name leaf that last established `typ`.
    pub type_name: NodeId,
    pub decl_name: Option<NodeId>,
    pub decl_node: Option<NodeId>,
    pub value_node: Option<NodeId>,
    pub annotations: Vec<NodeId>,
    pub display_name: Option<String>,
    pub compartment: Option<String>,
    pub is_const: bool,
    pub is_substance_only: bool,
    /// Appeared as a reactant or product.
    pub in_reaction: bool,
    pub rate_rule: Option<String>,
    pub unit: Option<String>,
    /// Present on functions and modular models.
    pub parameters: Option<Vec<Symbol>>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, typ: SymbolType, type_name: NodeId) -> Self {
        Symbol {
            name: name.into(),
            typ,
            type_name,
            decl_name: None,
            decl_node: None,
            value_node: None,
            annotations: Vec::new(),
            display_name: None,
            compartment: None,
            is_const: false,
            is_substance_only: false,
            in_reaction: false,
            rate_rule: None,
            unit: None,
            parameters: None,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn params(&self) -> &[Symbol] {
        self.parameters.as_deref().unwrap_or(&[])
    }

    /// The node to treat as the definition site: the value, else the
    /// declared name, else the name that first set the type.
    pub fn def_node(&self) -> NodeId {
        self.value_node.or(self.decl_name).unwrap_or(self.type_name)
    }

    /// Markdown hover text.
    pub fn help_str(&self, tree: &Tree) -> String {
        let mut out = if self.is_callable() {
            let params: Vec<String> = self
                .params()
                .iter()
                .map(|p| {
                    if self.typ == SymbolType::ModularModel {
                        format!("{}: {}", p.typ, p.name)
                    } else {
                        p.name.clone()
                    }
                })
                .collect();
            format!("```\n{}({})\n```", self.name, params.join(", "))
        } else {
            match self.initial_number(tree) {
                Some(value) => {
                    let unit = self
                        .unit
                        .as_deref()
                        .map(|u| format!(" ({})", u))
                        .unwrap_or_default();
                    format!(
                        "```\n({}) {}\nInitialized Value: {}{}\n```",
                        self.typ, self.name, value, unit
                    )
                }
                None => format!("```\n({}) {}\n```", self.typ, self.name),
            }
        };
        if let Some(display) = &self.display_name {
            out.push_str(&format!("\n\n***\n\n{}", display));
        }
        if let Some(&first) = self.annotations.first() {
            if let Some(a) = crate::tree::ast::Annotation::cast(tree, first) {
                out.push_str(&format!("\n\n***\n\n{}", a.uri()));
            }
        }
        out
    }

    /// Text of the value node's expression when it is a literal number.
    fn initial_number<'t>(&self, tree: &'t Tree) -> Option<&'t str> {
        let node = self.value_node?;
        let value = match tree.kind(node) {
            NodeKind::Assignment => tree.child(node, 2),
            NodeKind::DeclItem => tree.child(node, 1).and_then(|d| tree.child(d, 1)),
            _ => None,
        }?;
        (tree.kind(value) == NodeKind::Number).then(|| tree.text(value))
    }
}

// ──────────────────────────────────────────────
// Table
// ──────────────────────────────────────────────

/// A scope plus the exact `Name` leaf that spelled the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub scope: Scope,
    pub name: NodeId,
}

impl QName {
    pub fn new(scope: Scope, name: NodeId) -> Self {
        QName { scope, name }
    }
}

/// Incidental facts recorded alongside a type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    pub is_const: Option<bool>,
    pub compartment: Option<String>,
    pub substance_only: bool,
    pub in_reaction: bool,
}

impl Flags {
    fn apply(&self, sym: &mut Symbol, overwrite: bool) {
        if let Some(c) = self.is_const {
            if overwrite || !sym.is_const {
                sym.is_const = c;
            }
        }
        if let Some(comp) = &self.compartment {
            if overwrite || sym.compartment.is_none() {
                sym.compartment = Some(comp.clone());
            }
        }
        sym.is_substance_only |= self.substance_only;
        sym.in_reaction |= self.in_reaction;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    tables: BTreeMap<Scope, BTreeMap<String, Symbol>>,
    qnames: Vec<QName>,
    issues: Vec<Issue>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues raised while inserting, in discovery order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub(crate) fn push_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Every qualified name seen by an insert, in order.
    pub fn qnames(&self) -> &[QName] {
        &self.qnames
    }

    /// The symbol `name` in `scope`, if any.
    pub fn lookup(&self, scope: &Scope, name: &str) -> Option<&Symbol> {
        self.tables.get(scope).and_then(|t| t.get(name))
    }

    /// Look `name` up in `scope`, falling back to the global scope.
    pub fn resolve(&self, scope: &Scope, name: &str) -> Option<&Symbol> {
        self.lookup(scope, name)
            .or_else(|| self.lookup(&Scope::Global, name))
    }

    pub fn lookup_mut(&mut self, scope: &Scope, name: &str) -> Option<&mut Symbol> {
        self.tables.get_mut(scope).and_then(|t| t.get_mut(name))
    }

    /// Zero or one symbols for `qname`.
    pub fn get(&self, tree: &Tree, qname: &QName) -> Vec<&Symbol> {
        self.lookup(&qname.scope, tree.text(qname.name))
            .into_iter()
            .collect()
    }

    /// Symbols of one scope, ordered by name.
    pub fn scope_symbols(&self, scope: &Scope) -> impl Iterator<Item = &Symbol> {
        self.tables.get(scope).into_iter().flat_map(|t| t.values())
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.tables.keys()
    }

    /// Names across every scope.
    pub fn all_names(&self) -> BTreeSet<String> {
        self.tables
            .values()
            .flat_map(|t| t.keys().cloned())
            .collect()
    }

    /// First of `prefix0`, `prefix1`, ... not taken in `scope`, or in any
    /// scope when `scope` is `None`.
    pub fn unique_name(&self, prefix: &str, scope: Option<&Scope>) -> String {
        let taken: BTreeSet<String> = match scope {
            Some(s) => self
                .tables
                .get(s)
                .map(|t| t.keys().cloned().collect())
                .unwrap_or_default(),
            None => self.all_names(),
        };
        (0..)
            .map(|i| format!("{}{}", prefix, i))
            .find(|n| !taken.contains(n))
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Insert or refine a variable symbol.
    ///
    /// Narrowing replaces the type; a wider or equal type only merges
    /// flags; an incomparable type reports a pair of `IncompatibleType`
    /// issues and changes nothing. A new value always replaces the old
    /// one, with a warning pair when one existed.
    pub fn insert(
        &mut self,
        tree: &Tree,
        qname: &QName,
        typ: SymbolType,
        decl_node: Option<NodeId>,
        value_node: Option<NodeId>,
        flags: Flags,
    ) {
        self.qnames.push(qname.clone());
        let name = tree.text(qname.name).to_string();
        let table = self.tables.entry(qname.scope.clone()).or_default();

        match table.get_mut(&name) {
            None => {
                let mut sym = Symbol::new(name.clone(), typ, qname.name);
                flags.apply(&mut sym, true);
                table.insert(name.clone(), sym);
            }
            Some(sym) => {
                let old = sym.typ;
                if typ.derives_from(old) {
                    sym.typ = typ;
                    sym.type_name = qname.name;
                    flags.apply(sym, true);
                } else if old.derives_from(typ) {
                    flags.apply(sym, false);
                } else {
                    let old_range = tree.range(sym.type_name);
                    let new_range = value_node
                        .map(|v| tree.range(v))
                        .unwrap_or_else(|| tree.range(qname.name));
                    self.issues
                        .push(Issue::incompatible_type(new_range, typ, old, old_range));
                    self.issues
                        .push(Issue::incompatible_type(old_range, typ, old, new_range));
                    return;
                }
            }
        }
        let Some(sym) = table.get_mut(&name) else {
            return;
        };

        if let Some(value) = value_node {
            if let Some(old) = sym.value_node {
                let (old_range, new_range) = (tree.range(old), tree.range(value));
                self.issues
                    .push(Issue::obscured_value(old_range, new_range, &name));
                self.issues
                    .push(Issue::overrode_value(new_range, old_range, &name));
            }
            sym.value_node = Some(value);
        } else if let Some(decl) = decl_node {
            if let Some(old) = sym.decl_node {
                if tree.kind(decl) != NodeKind::Declaration {
                    let (old_range, new_range) = (tree.range(old), tree.range(decl));
                    if tree.kind(decl) == NodeKind::VariableIn {
                        self.issues.push(Issue::obscured_value_compartment(
                            old_range, new_range, &name,
                        ));
                        self.issues.push(Issue::obscured_value_compartment(
                            new_range, old_range, &name,
                        ));
                    } else {
                        self.issues
                            .push(Issue::obscured_value(old_range, new_range, &name));
                        self.issues
                            .push(Issue::overrode_value(new_range, old_range, &name));
                    }
                }
            }
            sym.decl_node = Some(decl);
            sym.decl_name = Some(qname.name);
        }
    }

    /// Insert a callable (function or modular model) into `qname.scope`.
    /// Redefinition is always an error, reported at both sites.
    pub fn insert_callable(
        &mut self,
        tree: &Tree,
        qname: &QName,
        typ: SymbolType,
        parameters: Vec<Symbol>,
        decl_node: NodeId,
    ) {
        self.qnames.push(qname.clone());
        let name = tree.text(qname.name).to_string();
        let table = self.tables.entry(qname.scope.clone()).or_default();
        match table.get_mut(&name) {
            None => {
                let mut sym = Symbol::new(name.clone(), typ, qname.name);
                sym.parameters = Some(parameters);
                sym.decl_node = Some(decl_node);
                sym.decl_name = Some(qname.name);
                table.insert(name, sym);
            }
            Some(sym) => {
                let old_range = tree.range(sym.type_name);
                let new_range = tree.range(qname.name);
                if typ.derives_from(sym.typ) {
                    sym.typ = typ;
                    sym.type_name = qname.name;
                    sym.parameters = Some(parameters);
                    sym.decl_node = Some(decl_node);
                    sym.decl_name = Some(qname.name);
                    self.issues
                        .push(Issue::redefined_function(old_range, &name, new_range));
                    self.issues
                        .push(Issue::redefined_function(new_range, &name, old_range));
                } else {
                    let old = sym.typ;
                    self.issues
                        .push(Issue::incompatible_type(new_range, typ, old, old_range));
                    self.issues
                        .push(Issue::incompatible_type(old_range, typ, old, new_range));
                }
            }
        }
    }

    /// Insert a function into the global scope and its own scope.
    pub fn insert_function(
        &mut self,
        tree: &Tree,
        name: NodeId,
        parameters: Vec<Symbol>,
        decl_node: NodeId,
    ) {
        let own = Scope::Function(tree.text(name).to_string());
        self.insert_callable(
            tree,
            &QName::new(Scope::Global, name),
            SymbolType::Function,
            parameters.clone(),
            decl_node,
        );
        self.insert_callable(
            tree,
            &QName::new(own, name),
            SymbolType::Function,
            parameters,
            decl_node,
        );
    }

    /// Insert a modular model into the global scope and its own scope.
    pub fn insert_mmodel(
        &mut self,
        tree: &Tree,
        name: NodeId,
        parameters: Vec<Symbol>,
        decl_node: NodeId,
    ) {
        let own = Scope::Module(tree.text(name).to_string());
        self.insert_callable(
            tree,
            &QName::new(Scope::Global, name),
            SymbolType::ModularModel,
            parameters.clone(),
            decl_node,
        );
        self.insert_callable(
            tree,
            &QName::new(own, name),
            SymbolType::ModularModel,
            parameters,
            decl_node,
        );
    }

    /// Attach an annotation node, creating an `Unknown` symbol if needed.
    pub fn insert_annotation(&mut self, tree: &Tree, qname: &QName, annotation: NodeId) {
        let name = tree.text(qname.name).to_string();
        let table = self.tables.entry(qname.scope.clone()).or_default();
        table
            .entry(name.clone())
            .or_insert_with(|| Symbol::new(name, SymbolType::Unknown, qname.name))
            .annotations
            .push(annotation);
    }

    /// Set a symbol's display name, warning when one was already set.
    /// Callables mirror the name into their other copy.
    pub fn set_display_name(&mut self, scope: &Scope, name: &str, display: &str, site: Range) {
        let Some(sym) = self.lookup_mut(scope, name) else {
            return;
        };
        let previous = sym.display_name.replace(display.to_string());
        let callable = sym.typ;
        if previous.is_some() {
            self.issues.push(Issue::overriding_display_name(site, name));
        }
        let mirror = match callable {
            SymbolType::Function if scope.is_global() => Some(Scope::Function(name.to_string())),
            SymbolType::ModularModel if scope.is_global() => Some(Scope::Module(name.to_string())),
            SymbolType::Function | SymbolType::ModularModel => Some(Scope::Global),
            _ => None,
        };
        if let Some(mirror) = mirror {
            if let Some(other) = self.lookup_mut(&mirror, name) {
                other.display_name = Some(display.to_string());
            }
        }
    }
}
