use std::path::Path;

use antimony_core::Context;

use crate::{print_json, read_source, OutputFormat};

pub(crate) fn cmd_tree(file: &Path, output: OutputFormat, quiet: bool) {
    let source = read_source(file, output, quiet);
    let tree = Context::new().parse(&source);
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "nodes": tree.len(),
            "tree": tree.pretty(),
        })),
        OutputFormat::Text => print!("{}", tree.pretty()),
    }
}
