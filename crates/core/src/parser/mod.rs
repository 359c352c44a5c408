//! Recovering LALR(1) parser.
//!
//! The caller's text always gets a trailing newline before lexing, so a
//! document that stops mid-statement looks like any other statement cut
//! short by a line break. In recovering mode the parser never fails:
//! unexpected input is folded into `ErrorNode`/`ErrorToken` markers and
//! parsing resumes at the last statement boundary.

mod recovery;

use crate::automaton::{Driver, Fed, RawTree, RawValue};
use crate::error::SyntaxError;
use crate::lalr::ParseTable;
use crate::lexer::{Lexer, Spanned, Token};
use crate::position::Position;
use crate::tree::builder::build_tree;
use crate::tree::{NodeKind, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Fail on the first unexpected token or character.
    Strict,
    /// Always produce a tree.
    Recovering,
}

/// Parse `text` into a tree.
pub fn parse(table: &ParseTable, text: &str, mode: ParseMode) -> Result<Tree, SyntaxError> {
    match mode {
        ParseMode::Strict => {
            let source = format!("{}\n", text);
            let (root, tail) = Parser::new(table, &source).run_strict()?;
            Ok(build_tree(root, tail, text.len()))
        }
        ParseMode::Recovering => Ok(parse_recovering(table, text)),
    }
}

/// Parse `text` with error recovery.
pub fn parse_recovering(table: &ParseTable, text: &str) -> Tree {
    let source = format!("{}\n", text);
    let (root, tail) = Parser::new(table, &source).run_recovering();
    build_tree(root, tail, text.len())
}

/// Run the recovering parser over `text` but stop before the first token
/// that ends after `stop`, returning the driver in that state.
pub fn parse_until<'t>(table: &'t ParseTable, text: &str, stop: Position) -> Driver<'t> {
    let source = format!("{}\n", text);
    let mut parser = Parser::new(table, &source);
    recovery::prime(&mut parser.driver);
    loop {
        match parser.lexer.next_token() {
            Ok(Some(tok)) => {
                if stop < tok.range.end {
                    break;
                }
                parser.feed(tok);
            }
            Ok(None) => break,
            Err(err) => {
                if stop <= err.pos {
                    break;
                }
                parser.skip_invalid();
            }
        }
    }
    parser.driver
}

struct Parser<'t, 's> {
    driver: Driver<'t>,
    lexer: Lexer<'s>,
}

impl<'t, 's> Parser<'t, 's> {
    fn new(table: &'t ParseTable, source: &'s str) -> Self {
        Parser {
            driver: Driver::new(table),
            lexer: Lexer::new(source),
        }
    }

    fn eof(&self) -> Spanned {
        Spanned::synthetic(Token::Eof, self.lexer.position(), self.lexer.offset())
    }

    fn run_strict(&mut self) -> Result<(RawTree, String), SyntaxError> {
        loop {
            match self.lexer.next_token() {
                Ok(Some(tok)) => {
                    if let Fed::Rejected(tok) = self.driver.feed(tok) {
                        return Err(SyntaxError::new(tok.text, tok.range.start, tok.range.end));
                    }
                }
                Ok(None) => {
                    let tail = self.lexer.take_trivia();
                    let eof = self.eof();
                    return match self.driver.feed(eof) {
                        Fed::Accepted(root) => Ok((file_node(root), tail)),
                        _ => {
                            let pos = self.lexer.position();
                            Err(SyntaxError::new("", pos, pos))
                        }
                    };
                }
                Err(err) => {
                    let text = err.ch.to_string();
                    let end = err.pos.advanced_by(&text);
                    return Err(SyntaxError::new(text, err.pos, end));
                }
            }
        }
    }

    fn run_recovering(&mut self) -> (RawTree, String) {
        recovery::prime(&mut self.driver);
        loop {
            match self.lexer.next_token() {
                Ok(Some(tok)) => self.feed(tok),
                Ok(None) => break,
                Err(err) => {
                    tracing::trace!(ch = %err.ch, pos = %err.pos, "unexpected character");
                    self.skip_invalid();
                }
            }
        }

        let tail = self.lexer.take_trivia();
        let eof = self.eof();
        let root = match self.driver.feed(eof.clone()) {
            Fed::Accepted(root) => Some(root),
            _ => {
                tracing::trace!(pos = %eof.range.start, "unexpected end of input");
                recovery::recover(&mut self.driver, None, true);
                match self.driver.feed(eof) {
                    Fed::Accepted(root) => Some(root),
                    _ => None,
                }
            }
        };
        let mut root = match root {
            Some(root) => file_node(root),
            None => self.salvage(),
        };
        recovery::strip_placeholders(&mut root);
        (root, tail)
    }

    fn feed(&mut self, tok: Spanned) {
        if let Fed::Rejected(tok) = self.driver.feed(tok) {
            tracing::trace!(text = %tok.text, pos = %tok.range.start, "unexpected token");
            recovery::recover(&mut self.driver, Some(RawValue::ErrorToken(tok)), false);
        }
    }

    /// Step over a character no token starts with and keep it as an
    /// error token.
    fn skip_invalid(&mut self) {
        let tok = self.lexer.skip_char();
        recovery::recover(&mut self.driver, tok.map(RawValue::ErrorToken), false);
    }

    /// Everything left on the stack under a file node.
    fn salvage(&mut self) -> RawTree {
        let mut root = RawTree {
            kind: NodeKind::FileNode,
            children: Vec::new(),
        };
        for value in std::mem::take(&mut self.driver.value_stack) {
            match value {
                RawValue::Tree(t) if t.kind == NodeKind::FileNode => {
                    root.children.extend(t.children)
                }
                other => root.children.push(Some(RawValue::Tree(RawTree {
                    kind: NodeKind::ErrorNode,
                    children: vec![Some(other)],
                }))),
            }
        }
        root
    }
}

fn file_node(root: RawValue) -> RawTree {
    match root {
        RawValue::Tree(t) if t.kind == NodeKind::FileNode => t,
        other => RawTree {
            kind: NodeKind::FileNode,
            children: vec![Some(other)],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    fn kinds(tree: &Tree) -> Vec<NodeKind> {
        tree.children(tree.root()).map(|c| tree.kind(c)).collect()
    }

    #[test]
    fn error_isolation() {
        let table = ParseTable::build(grammar::antimony());
        let tree = parse_recovering(&table, "a = 1\nb = )\nc = 3");
        assert_eq!(
            kinds(&tree),
            vec![
                NodeKind::SimpleStmt,
                NodeKind::ErrorNode,
                NodeKind::ErrorToken,
                NodeKind::SimpleStmt,
                NodeKind::SimpleStmt,
            ]
        );
        let first = tree.child(tree.root(), 0).and_then(|s| tree.child(s, 0));
        assert_eq!(first.map(|f| tree.kind(f)), Some(NodeKind::Assignment));
        let last = tree.child(tree.root(), 4).and_then(|s| tree.child(s, 0));
        assert_eq!(last.map(|f| tree.kind(f)), Some(NodeKind::Assignment));
    }

    #[test]
    fn round_trip_on_garbage() {
        let table = ParseTable::build(grammar::antimony());
        for src in [
            "",
            "%%%",
            "\"unterminated",
            "/* open comment",
            "model m\n  a = 1\n",
            "end end end",
            ") ( ; ; -> =>",
            "a = 1 # note\n\n  // tail\n",
            "J0: A -> ; k*A\nfunction f(x\n",
        ] {
            let tree = parse_recovering(&table, src);
            assert_eq!(tree.source(), format!("{}\n", src), "source {:?}", src);
        }
    }

    #[test]
    fn complete_statement_is_not_swallowed() {
        let table = ParseTable::build(grammar::antimony());
        let tree = parse_recovering(&table, "a = 1; )");
        let first = tree.child(tree.root(), 0).expect("stmt");
        assert_eq!(tree.kind(first), NodeKind::SimpleStmt);
        assert!(tree
            .children(tree.root())
            .all(|c| tree.kind(c) != NodeKind::ErrorNode));
    }

    #[test]
    fn unterminated_model_is_wrapped() {
        let table = ParseTable::build(grammar::antimony());
        let tree = parse_recovering(&table, "model m\n  a = 1\n");
        assert_eq!(kinds(&tree), vec![NodeKind::ErrorNode]);
    }

    #[test]
    fn prefix_driver_stops_before_position() {
        let table = ParseTable::build(grammar::antimony());
        let driver = parse_until(&table, "A -> B; k", Position::new(1, 8));
        assert!(driver.accepts(Token::Number));
        let driver = parse_until(&table, "A -> B; k", Position::new(1, 3));
        assert!(driver.accepts(Token::Arrow));
    }

    #[test]
    fn strict_mode_fails_fast() {
        let table = ParseTable::build(grammar::antimony());
        let err = parse(&table, "a = = 1", ParseMode::Strict).unwrap_err();
        assert_eq!(err.text, "=");
        assert_eq!(err.pos, Position::new(1, 5));
    }
}
