//! antimony-core: parsing and analysis backend for the Antimony modeling
//! language.
//!
//! Turns arbitrary, possibly malformed Antimony text into a lossless
//! syntax tree and a scoped symbol table, and answers the position
//! queries an editor needs.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Context`] -- compiled parse table; entry point for parse/analyze
//! - [`Analysis`] -- tree, symbol table and issues of one document
//! - [`Tree`], [`NodeId`], [`NodeKind`] -- the arena syntax tree
//! - [`SymbolTable`], [`Symbol`], [`SymbolType`], [`Scope`]
//! - [`Issue`], [`IssueKind`], [`Severity`] -- diagnostics
//! - [`SyntaxError`] -- the failure of a strict parse
//! - [`Position`], [`Range`], [`Location`] -- 1-based source geometry
//!
//! ```
//! use antimony_core::Context;
//!
//! let ctx = Context::new();
//! let analysis = ctx.analyze("J0: A -> B; k*A\nk = 0.1");
//! assert!(!analysis.has_errors());
//! ```

pub mod analysis;
pub mod automaton;
pub mod completion;
pub mod context;
pub mod error;
pub mod format;
pub mod grammar;
pub mod issue;
pub mod lalr;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod query;
pub mod scope;
pub mod symbols;
pub mod tree;

// ── Convenience re-exports: key types ────────────────────────────────

pub use analysis::Analysis;
pub use completion::{Completion, CompletionKind};
pub use context::Context;
pub use error::SyntaxError;
pub use issue::{Issue, IssueKind, Severity};
pub use parser::ParseMode;
pub use position::{Location, Position, Range};
pub use query::OutlineItem;
pub use scope::Scope;
pub use symbols::{Symbol, SymbolTable, SymbolType};
pub use tree::{NodeId, NodeKind, Tree};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use analysis::analyze;
pub use format::format;
