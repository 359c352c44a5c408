use std::path::Path;
use std::process;

use antimony_core::{Context, Issue};
use serde::Serialize;

use crate::config::Config;
use crate::{print_json, read_source, OutputFormat};

#[derive(Serialize)]
struct CheckReport<'a> {
    file: String,
    errors: usize,
    warnings: usize,
    issues: Vec<&'a Issue>,
}

pub(crate) fn cmd_check(
    file: &Path,
    strict: bool,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let source = read_source(file, output, quiet);
    let ctx = Context::new();

    if strict {
        if let Err(e) = ctx.parse_strict(&source) {
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "file": file.display().to_string(),
                    "syntax_error": e,
                })),
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("{}: {}", file.display(), e);
                    }
                }
            }
            process::exit(1);
        }
    }

    let analysis = ctx.analyze(&source);
    let all = analysis.issues();
    let errors = all.iter().filter(|i| i.is_error()).count();
    let warnings = all.len() - errors;
    tracing::debug!(file = %file.display(), errors, warnings, "checked");

    let shown: Vec<&Issue> = all
        .iter()
        .filter(|i| config.diagnostics.warnings || i.is_error())
        .collect();

    match output {
        OutputFormat::Json => print_json(&CheckReport {
            file: file.display().to_string(),
            errors,
            warnings,
            issues: shown,
        }),
        OutputFormat::Text => {
            for issue in &shown {
                println!("{}:{}", file.display(), issue);
            }
            if !quiet {
                println!("{} error(s), {} warning(s)", errors, warnings);
            }
        }
    }

    if errors > 0 || (config.diagnostics.deny_warnings && warnings > 0) {
        process::exit(1);
    }
}
