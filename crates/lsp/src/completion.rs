//! Completion provider.
//!
//! Offers every name of the document, plus a mass-action rate-law snippet
//! when the cursor sits at the start of an empty reaction rate law.

use antimony_core::{Analysis, Completion, CompletionKind, Context};
use lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Position};

use crate::document::from_lsp_position;

/// Compute completions for the given position in the document.
pub fn compute_completions(
    ctx: &Context,
    analysis: &Analysis,
    position: Position,
) -> Vec<CompletionItem> {
    ctx.completions(analysis, from_lsp_position(position))
        .into_iter()
        .map(to_item)
        .collect()
}

fn to_item(completion: Completion) -> CompletionItem {
    match completion.kind {
        CompletionKind::Text => CompletionItem {
            label: completion.text,
            kind: Some(CompletionItemKind::TEXT),
            ..Default::default()
        },
        CompletionKind::RateLaw => CompletionItem {
            label: "Mass action rate law".to_string(),
            kind: Some(CompletionItemKind::SNIPPET),
            detail: Some(completion.text.clone()),
            insert_text: Some(completion.text),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            // rank ahead of plain names
            sort_text: Some("0".to_string()),
            ..Default::default()
        },
    }
}
