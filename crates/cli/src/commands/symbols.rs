use std::path::Path;

use antimony_core::{Context, Range, Scope, SymbolType};
use serde::Serialize;

use crate::{print_json, read_source, OutputFormat};

/// One line of the symbol listing.
#[derive(Serialize)]
struct SymbolRow {
    scope: String,
    name: String,
    #[serde(rename = "type")]
    typ: SymbolType,
    /// Range of the definition site.
    range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    is_const: bool,
}

pub(crate) fn cmd_symbols(file: &Path, output: OutputFormat, quiet: bool) {
    let source = read_source(file, output, quiet);
    let analysis = Context::new().analyze(&source);
    let tree = analysis.tree();
    let table = analysis.table();

    let rows: Vec<SymbolRow> = table
        .scopes()
        .flat_map(|scope: &Scope| {
            table.scope_symbols(scope).map(move |sym| SymbolRow {
                scope: scope.to_string(),
                name: sym.name.clone(),
                typ: sym.typ,
                range: tree.range(sym.def_node()),
                compartment: sym.compartment.clone(),
                display_name: sym.display_name.clone(),
                unit: sym.unit.clone(),
                is_const: sym.is_const,
            })
        })
        .collect();

    match output {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                let mut line = format!("{}\t{}\t{}\t{}", row.scope, row.typ, row.name, row.range);
                if let Some(c) = &row.compartment {
                    line.push_str(&format!("\tin {}", c));
                }
                if row.is_const {
                    line.push_str("\tconst");
                }
                println!("{}", line);
            }
        }
    }
}
