use std::path::Path;

use antimony_core::{CompletionKind, Context, Position};

use crate::{print_json, read_source, OutputFormat};

pub(crate) fn cmd_complete(
    file: &Path,
    line: u32,
    column: u32,
    output: OutputFormat,
    quiet: bool,
) {
    let source = read_source(file, output, quiet);
    let ctx = Context::new();
    let analysis = ctx.analyze(&source);
    let pos = Position::new(line.max(1), column.max(1));
    let completions = ctx.completions(&analysis, pos);

    match output {
        OutputFormat::Json => print_json(&completions),
        OutputFormat::Text => {
            for c in &completions {
                match c.kind {
                    CompletionKind::Text => println!("{}", c.text),
                    CompletionKind::RateLaw => println!("rate law: {}", c.text),
                }
            }
        }
    }
}
