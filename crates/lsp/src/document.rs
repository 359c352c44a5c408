//! Document state management for open files in the editor.
//!
//! Every accepted edit re-runs the full analysis. Edits are ordered by
//! the editor's version number: an edit older than the one already held
//! is dropped, so a late notification can never replace newer results.

use std::collections::HashMap;
use std::path::PathBuf;

use antimony_core::{Analysis, Context};

/// Tracks which documents are currently open in the editor.
pub struct DocumentState {
    documents: HashMap<String, DocumentInfo>,
}

/// Information about a single open document.
pub struct DocumentInfo {
    /// File system path for this document.
    pub path: PathBuf,
    /// Editor-reported version number.
    pub version: i32,
    /// Latest content from the editor.
    pub content: String,
    /// Analysis of `content`.
    pub analysis: Analysis,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentState {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    /// Track a newly opened document.
    pub fn open(&mut self, ctx: &Context, uri: &str, path: PathBuf, version: i32, content: String) {
        let analysis = ctx.analyze(&content);
        self.documents.insert(
            uri.to_owned(),
            DocumentInfo {
                path,
                version,
                content,
                analysis,
            },
        );
    }

    /// Replace the content of an open document. Returns `false` when the
    /// document is unknown or `version` is older than the one held.
    pub fn change(&mut self, ctx: &Context, uri: &str, version: i32, content: String) -> bool {
        let Some(doc) = self.documents.get_mut(uri) else {
            return false;
        };
        if version < doc.version {
            tracing::debug!(uri, version, current = doc.version, "dropping stale edit");
            return false;
        }
        doc.analysis = ctx.analyze(&content);
        doc.version = version;
        doc.content = content;
        true
    }

    /// Remove a closed document from tracking.
    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Get information about an open document.
    pub fn get(&self, uri: &str) -> Option<&DocumentInfo> {
        self.documents.get(uri)
    }
}

// ── Position conversion ──────────────────────────────────────────────

/// Core positions are 1-based; LSP positions are 0-based.
pub fn to_lsp_position(pos: antimony_core::Position) -> lsp_types::Position {
    lsp_types::Position::new(pos.line.saturating_sub(1), pos.column.saturating_sub(1))
}

pub fn to_lsp_range(range: antimony_core::Range) -> lsp_types::Range {
    lsp_types::Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

pub fn from_lsp_position(pos: lsp_types::Position) -> antimony_core::Position {
    antimony_core::Position::new(pos.line + 1, pos.character + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_versions_are_dropped() {
        let ctx = Context::new();
        let mut state = DocumentState::new();
        state.open(&ctx, "file:///a.ant", PathBuf::from("/a.ant"), 1, "a = 1".into());
        assert!(state.change(&ctx, "file:///a.ant", 3, "a = 3".into()));
        assert!(!state.change(&ctx, "file:///a.ant", 2, "a = 2".into()));
        let doc = state.get("file:///a.ant").expect("open");
        assert_eq!(doc.version, 3);
        assert_eq!(doc.content, "a = 3");
        assert!(!state.change(&ctx, "file:///b.ant", 1, String::new()));
    }

    #[test]
    fn positions_shift_by_one() {
        let core = antimony_core::Position::new(3, 5);
        let lsp = to_lsp_position(core);
        assert_eq!((lsp.line, lsp.character), (2, 4));
        assert_eq!(from_lsp_position(lsp), core);
    }
}
