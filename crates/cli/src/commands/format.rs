use std::path::Path;
use std::process;

use antimony_core::{format, Context};

use crate::{print_json, read_source, report_error, OutputFormat};

pub(crate) fn cmd_format(file: &Path, write: bool, check: bool, output: OutputFormat, quiet: bool) {
    let source = read_source(file, output, quiet);
    let ctx = Context::new();
    let formatted = format(&ctx.parse(&source));
    let changed = formatted != source;

    if check {
        match output {
            OutputFormat::Json => print_json(&serde_json::json!({
                "file": file.display().to_string(),
                "formatted": !changed,
            })),
            OutputFormat::Text => {
                if changed && !quiet {
                    eprintln!("{} is not formatted", file.display());
                }
            }
        }
        if changed {
            process::exit(1);
        }
        return;
    }

    if write {
        if changed {
            if let Err(e) = std::fs::write(file, &formatted) {
                let msg = format!("error writing file '{}': {}", file.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        }
        tracing::debug!(file = %file.display(), changed, "formatted in place");
        if output == OutputFormat::Json {
            print_json(&serde_json::json!({
                "file": file.display().to_string(),
                "changed": changed,
            }));
        }
        return;
    }

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "text": formatted,
        })),
        OutputFormat::Text => print!("{}", formatted),
    }
}
