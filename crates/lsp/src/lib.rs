//! Antimony Language Server Protocol implementation for IDE integration.
//!
//! Re-analyzes a document on every open and change, publishes its
//! issues as diagnostics, and answers hover, completion, go-to-definition
//! and document-symbol requests from the latest analysis. Connects to
//! editors via the `antimony lsp` CLI subcommand over stdio.

pub mod completion;
pub mod diagnostics;
pub mod document;
pub mod hover;
pub mod navigation;
pub mod server;

/// Run the LSP server over stdio. This is the public entry point
/// called by `antimony lsp`.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    server::run()
}
