//! Hover information for names.
//!
//! Shows the type, initial value, display name and first annotation of
//! the symbol under the cursor.

use antimony_core::Analysis;
use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::document::{from_lsp_position, to_lsp_range};

/// Compute hover information for the name at the given position.
pub fn compute_hover(analysis: &Analysis, position: Position) -> Option<Hover> {
    let (symbols, range) = analysis.symbols_at(from_lsp_position(position));
    let symbol = symbols.first()?;
    let markdown = symbol.help_str(analysis.tree());
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: range.map(to_lsp_range),
    })
}
