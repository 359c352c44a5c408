use std::fmt;

use serde::Serialize;

/// A namespace partition of the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Scope {
    /// Top level of the file, outside any block.
    Global,
    Model(String),
    Function(String),
    /// A modular model (a model with a parameter list).
    Module(String),
}

impl Scope {
    pub fn name(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Model(n) | Scope::Function(n) | Scope::Module(n) => Some(n),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Model(n) => write!(f, "model {}", n),
            Scope::Function(n) => write!(f, "function {}", n),
            Scope::Module(n) => write!(f, "module {}", n),
        }
    }
}
