//! Issue-to-diagnostic conversion.

use antimony_core::{Analysis, Issue, Severity};
use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::document::to_lsp_range;

/// Diagnostics for every issue of `analysis`, semantic issues first.
pub fn compute_diagnostics(analysis: &Analysis) -> Vec<Diagnostic> {
    analysis.get_issues().iter().map(to_diagnostic).collect()
}

fn to_diagnostic(issue: &Issue) -> Diagnostic {
    let severity = match issue.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
    };
    Diagnostic {
        range: to_lsp_range(issue.range),
        severity: Some(severity),
        code: Some(NumberOrString::String(format!("{:?}", issue.kind))),
        source: Some("antimony".to_string()),
        message: issue.message.clone(),
        ..Default::default()
    }
}
