//! The analysis context: owns the compiled parse table and runs the
//! pipeline over one document at a time.

use crate::analysis::{self, Analysis};
use crate::completion::{self, Completion};
use crate::error::SyntaxError;
use crate::grammar;
use crate::lalr::ParseTable;
use crate::parser::{self, ParseMode};
use crate::position::Position;
use crate::tree::Tree;

/// Build once, share by reference. Every call owns its own tree and
/// symbol table, so a context can serve any number of documents.
#[derive(Debug, Clone)]
pub struct Context {
    table: ParseTable,
}

impl Context {
    pub fn new() -> Self {
        let table = ParseTable::build(grammar::antimony());
        tracing::debug!(
            states = table.state_count(),
            conflicts = table.conflicts(),
            "parse table built"
        );
        Context { table }
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Parse with error recovery. Never fails.
    pub fn parse(&self, text: &str) -> Tree {
        parser::parse_recovering(&self.table, text)
    }

    /// Parse without recovery, failing on the first unexpected token.
    pub fn parse_strict(&self, text: &str) -> Result<Tree, SyntaxError> {
        parser::parse(&self.table, text, ParseMode::Strict)
    }

    /// Parse with recovery and run both analysis passes.
    pub fn analyze(&self, text: &str) -> Analysis {
        analysis::analyze(self.parse(text))
    }

    /// Completion candidates at `pos` in an analyzed document.
    pub fn completions(&self, analysis: &Analysis, pos: Position) -> Vec<Completion> {
        completion::completions(&self.table, analysis, pos)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn strict_mode_reports_first_error() {
        let ctx = Context::new();
        let err = ctx.parse_strict("a = 1\nb = * 2").unwrap_err();
        assert_eq!(err.text, "*");
        assert_eq!(err.pos, Position::new(2, 5));
        assert_eq!(err.end_pos, Position::new(2, 6));
    }

    #[test]
    fn strict_mode_reports_bad_character() {
        let ctx = Context::new();
        let err = ctx.parse_strict("a = %").unwrap_err();
        assert_eq!(err.text, "%");
        assert_eq!(err.pos, Position::new(1, 5));
    }

    #[test]
    fn strict_mode_reports_unterminated_block() {
        let ctx = Context::new();
        let err = ctx.parse_strict("model m\n  a = 1\n").unwrap_err();
        assert_eq!(err.text, "");
    }

    #[test]
    fn strict_mode_accepts_valid_input() {
        let ctx = Context::new();
        let tree = ctx.parse_strict("model m\n  a = 1\nend").expect("valid");
        assert_eq!(tree.source(), "model m\n  a = 1\nend\n");
    }
}
