//! Positioned diagnostics.
//!
//! Issues are accumulated, never thrown. Each [`IssueKind`] has a fixed
//! severity and message template; the constructors below are the only
//! way the analyzer produces them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::{Position, Range};
use crate::symbols::SymbolType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    UnexpectedToken,
    UnexpectedEOF,
    UnexpectedNewline,
    IncompatibleType,
    RefUndefined,
    SpeciesUndefined,
    UninitMModel,
    UninitFunction,
    IncorrectParamNum,
    ParamIncorrectType,
    UnusedParameter,
    UninitCompt,
    RateRuleNotInReaction,
    VarNotFound,
    RateRuleOverridden,
    ObscuredValue,
    OverrodeValue,
    OverridingDisplayName,
    ObscuredValueCompartment,
    RedefinedFunction,
    SubError,
}

impl IssueKind {
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::SpeciesUndefined
            | IssueKind::UnusedParameter
            | IssueKind::UninitCompt
            | IssueKind::VarNotFound
            | IssueKind::RateRuleOverridden
            | IssueKind::ObscuredValue
            | IssueKind::OverrodeValue
            | IssueKind::OverridingDisplayName
            | IssueKind::ObscuredValueCompartment => Severity::Warning,
            IssueKind::UnexpectedToken
            | IssueKind::UnexpectedEOF
            | IssueKind::UnexpectedNewline
            | IssueKind::IncompatibleType
            | IssueKind::RefUndefined
            | IssueKind::UninitMModel
            | IssueKind::UninitFunction
            | IssueKind::IncorrectParamNum
            | IssueKind::ParamIncorrectType
            | IssueKind::RateRuleNotInReaction
            | IssueKind::RedefinedFunction
            | IssueKind::SubError => Severity::Error,
        }
    }

    /// Syntax issues come from recovery markers rather than semantics.
    pub fn is_syntax(self) -> bool {
        matches!(
            self,
            IssueKind::UnexpectedToken | IssueKind::UnexpectedEOF | IssueKind::UnexpectedNewline
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub range: Range,
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.range.start, self.severity, self.message)
    }
}

fn at(p: Position) -> String {
    format!("line {}:{}", p.line, p.column)
}

impl Issue {
    pub fn new(kind: IssueKind, range: Range, message: impl Into<String>) -> Self {
        Issue {
            range,
            severity: kind.severity(),
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    // ── syntax ──────────────────────────────────────

    pub fn unexpected_token(range: Range, text: &str) -> Self {
        Issue::new(
            IssueKind::UnexpectedToken,
            range,
            format!("Unexpected token '{}'", text),
        )
    }

    /// Anchored at the last leaf before the end of input.
    pub fn unexpected_eof(range: Range) -> Self {
        Issue::new(IssueKind::UnexpectedEOF, range, "Expected a token")
    }

    /// Covers from the line break to the start of the next line.
    pub fn unexpected_newline(start: Position) -> Self {
        let range = Range::new(start, Position::new(start.line + 1, 1));
        Issue::new(IssueKind::UnexpectedNewline, range, "Expected a token")
    }

    // ── symbol table ────────────────────────────────

    /// Anchored at `range`; names the conflicting site `other`.
    pub fn incompatible_type(
        range: Range,
        new_type: SymbolType,
        old_type: SymbolType,
        other: Range,
    ) -> Self {
        Issue::new(
            IssueKind::IncompatibleType,
            range,
            format!(
                "Unable to set the type to '{}' because it is already set to be the incompatible type '{}' on {}",
                new_type,
                old_type,
                at(other.start)
            ),
        )
    }

    pub fn obscured_value(old: Range, new: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::ObscuredValue,
            old,
            format!(
                "Value assignment to '{}' is being overridden by a later assignment on {}",
                name,
                at(new.start)
            ),
        )
    }

    pub fn overrode_value(new: Range, old: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::OverrodeValue,
            new,
            format!(
                "Value assignment to '{}' is overriding previous assignment on {}",
                name,
                at(old.start)
            ),
        )
    }

    pub fn obscured_value_compartment(range: Range, other: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::ObscuredValueCompartment,
            range,
            format!(
                "Compartment assignment to '{}' is being overridden by another assignment on {}",
                name,
                at(other.start)
            ),
        )
    }

    pub fn redefined_function(range: Range, name: &str, other: Range) -> Self {
        Issue::new(
            IssueKind::RedefinedFunction,
            range,
            format!(
                "Cannot define '{}' as a new function because it is already a defined function on {}",
                name,
                at(other.start)
            ),
        )
    }

    pub fn overriding_display_name(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::OverridingDisplayName,
            range,
            format!("Display name already assigned to '{}'", name),
        )
    }

    // ── validation ──────────────────────────────────

    pub fn ref_undefined(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::RefUndefined,
            range,
            format!("Parameter '{}' missing value assignment", name),
        )
    }

    pub fn species_undefined(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::SpeciesUndefined,
            range,
            format!(
                "Species '{}' has not been initialized, using default value",
                name
            ),
        )
    }

    pub fn uninit_mmodel(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::UninitMModel,
            range,
            format!("Modular model '{}' not defined", name),
        )
    }

    pub fn uninit_function(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::UninitFunction,
            range,
            format!("Function '{}' not defined", name),
        )
    }

    pub fn incorrect_param_num(range: Range, expected: usize, given: usize) -> Self {
        Issue::new(
            IssueKind::IncorrectParamNum,
            range,
            format!(
                "Incorrect number of parameters, expected {}, given {}",
                expected, given
            ),
        )
    }

    pub fn param_incorrect_type(range: Range, expected: SymbolType, given: SymbolType) -> Self {
        Issue::new(
            IssueKind::ParamIncorrectType,
            range,
            format!(
                "Incorrect type being passed in, expected {}, given {}",
                expected, given
            ),
        )
    }

    pub fn unused_parameter(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::UnusedParameter,
            range,
            format!("Parameter '{}' defined but not used", name),
        )
    }

    pub fn uninit_compt(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::UninitCompt,
            range,
            format!(
                "Compartment '{}' has not been initialized, using default value",
                name
            ),
        )
    }

    pub fn rate_rule_not_in_reaction(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::RateRuleNotInReaction,
            range,
            format!(
                "Variable '{}' is also a non-fixed species defined in a reaction",
                name
            ),
        )
    }

    pub fn var_not_found(range: Range, name: &str) -> Self {
        Issue::new(
            IssueKind::VarNotFound,
            range,
            format!("Variable '{}' not found", name),
        )
    }

    pub fn rate_rule_overridden(range: Range, name: &str, previous: &str) -> Self {
        Issue::new(
            IssueKind::RateRuleOverridden,
            range,
            format!("Previous Rate Rule '{}' of {} is overridden", previous, name),
        )
    }

    pub fn sub_error(range: Range) -> Self {
        Issue::new(
            IssueKind::SubError,
            range,
            "The substanceOnly keyword only works with species",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn severities_are_fixed_per_kind() {
        assert_eq!(
            Issue::species_undefined(r(1, 1, 1, 2), "a").severity,
            Severity::Warning
        );
        assert_eq!(
            Issue::incorrect_param_num(r(1, 1, 1, 2), 2, 3).severity,
            Severity::Error
        );
        assert!(Issue::unexpected_eof(r(1, 1, 1, 2)).kind.is_syntax());
    }

    #[test]
    fn messages_name_the_other_site() {
        let issue = Issue::obscured_value(r(1, 1, 1, 6), r(2, 3, 2, 8), "x");
        assert_eq!(
            issue.message,
            "Value assignment to 'x' is being overridden by a later assignment on line 2:3"
        );
        let issue = Issue::incompatible_type(
            r(2, 1, 2, 2),
            SymbolType::Compartment,
            SymbolType::Species,
            r(1, 9, 1, 10),
        );
        assert!(issue.message.contains("'compartment'"));
        assert!(issue.message.ends_with("line 1:9"));
    }

    #[test]
    fn newline_issue_spans_to_next_line() {
        let issue = Issue::unexpected_newline(Position::new(1, 5));
        assert_eq!(issue.range, r(1, 5, 2, 1));
        assert_eq!(issue.message, "Expected a token");
    }

    #[test]
    fn serializes_with_lowercase_severity() {
        let issue = Issue::var_not_found(r(1, 1, 1, 2), "q");
        let json = serde_json::to_value(&issue).expect("serialize");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "VarNotFound");
        assert_eq!(json["message"], "Variable 'q' not found");
    }
}
