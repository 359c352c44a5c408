//! Navigation features: go-to-definition and document symbols.

use antimony_core::{Analysis, OutlineItem, SymbolType};
use lsp_types::{DocumentSymbol, Location, Position, SymbolKind, Uri};

use crate::document::{from_lsp_position, to_lsp_range};

/// Go-to-definition: definition sites of the name at `position`.
pub fn goto_definition(analysis: &Analysis, uri: &Uri, position: Position) -> Vec<Location> {
    analysis
        .goto(from_lsp_position(position), uri.as_str())
        .into_iter()
        .map(|loc| Location::new(uri.clone(), to_lsp_range(loc.range)))
        .collect()
}

/// Models, modules, functions and named reactions of the document.
pub fn document_symbols(analysis: &Analysis) -> Vec<DocumentSymbol> {
    analysis.outline().into_iter().map(to_symbol).collect()
}

#[allow(deprecated)] // `deprecated` field is required by the struct literal
fn to_symbol(item: OutlineItem) -> DocumentSymbol {
    let kind = match item.kind {
        SymbolType::Model | SymbolType::ModularModel => SymbolKind::MODULE,
        SymbolType::Function => SymbolKind::FUNCTION,
        _ => SymbolKind::EVENT,
    };
    DocumentSymbol {
        name: item.name,
        detail: Some(item.kind.to_string()),
        kind,
        tags: None,
        deprecated: None,
        range: to_lsp_range(item.range),
        selection_range: to_lsp_range(item.selection_range),
        children: None,
    }
}
