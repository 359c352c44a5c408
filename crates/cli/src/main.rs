mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Antimony model checker, formatter and language server.
#[derive(Parser)]
#[command(
    name = "antimony",
    version,
    about = "Antimony model checker, formatter and language server"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to the configuration file (default: ./antimony.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report syntax and semantic issues of a model file
    Check {
        /// Path to the .ant source file
        file: PathBuf,
        /// Stop at the first syntax error instead of recovering
        #[arg(long)]
        strict: bool,
    },

    /// Print the model with normalized spacing and indentation
    Format {
        /// Path to the .ant source file
        file: PathBuf,
        /// Rewrite the file in place instead of printing it
        #[arg(long)]
        write: bool,
        /// Exit non-zero when the file is not already formatted
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },

    /// Print the concrete syntax tree of a model file
    Tree {
        /// Path to the .ant source file
        file: PathBuf,
    },

    /// List the symbols of every scope
    Symbols {
        /// Path to the .ant source file
        file: PathBuf,
    },

    /// List completion candidates at a 1-based line and column
    Complete {
        /// Path to the .ant source file
        file: PathBuf,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// Start the Language Server Protocol server over stdio
    Lsp,
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e, cli.output, cli.quiet);
            process::exit(1);
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Check { file, strict } => {
            commands::check::cmd_check(&file, strict, &config, cli.output, cli.quiet);
        }
        Commands::Format { file, write, check } => {
            commands::format::cmd_format(&file, write, check, cli.output, cli.quiet);
        }
        Commands::Tree { file } => {
            commands::tree::cmd_tree(&file, cli.output, cli.quiet);
        }
        Commands::Symbols { file } => {
            commands::symbols::cmd_symbols(&file, cli.output, cli.quiet);
        }
        Commands::Complete { file, line, column } => {
            commands::complete::cmd_complete(&file, line, column, cli.output, cli.quiet);
        }
        Commands::Lsp => {
            if let Err(e) = antimony_lsp::run() {
                eprintln!("LSP server error: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`, which wins
/// over the configured level.
fn init_logging(verbose: u8, configured: &str) {
    let directive = match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        // stdout carries command output and the LSP channel
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a source file, exiting with a reported error when it cannot be read.
pub(crate) fn read_source(file: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Print a serializable value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", json);
}
