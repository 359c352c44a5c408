//! Project configuration read from `antimony.toml`.
//!
//! # Example
//!
//! ```toml
//! [diagnostics]
//! warnings = true
//! deny_warnings = false
//!
//! [logging]
//! level = "warn"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "antimony.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

/// `[diagnostics]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DiagnosticsConfig {
    /// Include warnings in `check` output.
    pub warnings: bool,
    /// Exit non-zero when warnings are present.
    pub deny_warnings: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            warnings: true,
            deny_warnings: false,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoggingConfig {
    /// Tracing directive used when `RUST_LOG` is unset and no `-v` is given.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

/// Read and parse a config file from `path`.
///
/// Returns a human-readable error string on failure.
pub(crate) fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// The explicit `--config` file, else `antimony.toml` when present, else
/// defaults. An explicit path must exist.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read_config(path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").expect("parse");
        assert_eq!(config, Config::default());
        assert!(config.diagnostics.warnings);
        assert!(!config.diagnostics.deny_warnings);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str("[diagnostics]\ndeny_warnings = true\n").expect("parse");
        assert!(config.diagnostics.warnings);
        assert!(config.diagnostics.deny_warnings);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<Config, _> = toml::from_str("[diagnostics]\nerrors = false\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/antimony.toml"))).unwrap_err();
        assert!(err.contains("could not read"));
    }
}
