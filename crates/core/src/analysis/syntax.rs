//! Issues for the markers error recovery left in the tree.

use std::collections::BTreeSet;

use crate::issue::Issue;
use crate::tree::{NodeKind, Tree};

/// One issue per source line, in document order.
pub(super) fn syntax_issues(tree: &Tree) -> Vec<Issue> {
    let mut lines = BTreeSet::new();
    let mut issues = Vec::new();
    for id in tree.descendants(tree.root()) {
        let issue = match tree.kind(id) {
            NodeKind::ErrorToken => {
                let text = tree.text(id);
                if !text.trim().is_empty() {
                    Some(Issue::unexpected_token(tree.range(id), text))
                } else if tree.is_synthetic_newline(id) {
                    None
                } else {
                    Some(Issue::unexpected_newline(tree.range(id).start))
                }
            }
            NodeKind::ErrorNode => tree.last_leaf(id).and_then(|last| {
                let at_end = match tree.next_leaf(last) {
                    None => true,
                    Some(next) => tree.is_synthetic_newline(next),
                };
                at_end.then(|| Issue::unexpected_eof(tree.range(last)))
            }),
            _ => None,
        };
        if let Some(issue) = issue {
            if lines.insert(issue.range.start.line) {
                issues.push(issue);
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::issue::IssueKind;
    use crate::position::{Position, Range};

    fn syntax(src: &str) -> Vec<(IssueKind, Range)> {
        let ctx = Context::new();
        ctx.analyze(src)
            .syntax_issues()
            .iter()
            .map(|i| (i.kind, i.range))
            .collect()
    }

    fn r(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn truncated_statement_at_end() {
        assert_eq!(syntax("a="), vec![(IssueKind::UnexpectedEOF, r(1, 2, 1, 3))]);
    }

    #[test]
    fn truncation_at_end_is_eof_whatever_the_statement() {
        assert_eq!(syntax("b = "), vec![(IssueKind::UnexpectedEOF, r(1, 3, 1, 4))]);
        assert_eq!(
            syntax("J0: A -> "),
            vec![(IssueKind::UnexpectedEOF, r(1, 7, 1, 9))]
        );
    }

    #[test]
    fn unexpected_newline_mid_document() {
        assert_eq!(
            syntax("ae= \n"),
            vec![(IssueKind::UnexpectedNewline, r(1, 5, 2, 1))]
        );
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(syntax("a=%"), vec![(IssueKind::UnexpectedToken, r(1, 3, 1, 4))]);
    }

    #[test]
    fn unexpected_name() {
        assert_eq!(
            syntax("a eee"),
            vec![(IssueKind::UnexpectedToken, r(1, 3, 1, 6))]
        );
    }

    #[test]
    fn one_issue_per_line() {
        let found = syntax("a = * * *\nb = 1");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, IssueKind::UnexpectedToken);
        assert_eq!(found[0].1.start, Position::new(1, 5));
    }

    #[test]
    fn valid_document_has_none() {
        assert!(syntax("a = 1\nJ0: A -> B; k\n").is_empty());
        assert!(syntax("").is_empty());
    }
}
