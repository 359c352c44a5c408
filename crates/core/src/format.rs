//! Whitespace-normalizing printer over the leaf chain.
//!
//! Each leaf is printed with spacing chosen by its kind and text. Newline
//! leaves keep their text, so indentation at the start of a line and
//! blank lines survive; comments are kept where they were.

use crate::tree::{NodeId, NodeKind, Tree};

/// Leaves followed by a space but not preceded by one.
const SPACE_AFTER: &[&str] = &[
    ",",
    ";",
    ":",
    "const",
    "var",
    "species",
    "formula",
    "compartment",
];

/// Punctuation printed without surrounding spaces.
const TIGHT: &[&str] = &["(", ")", "$", "'"];

/// Print `tree` with normalized spacing.
pub fn format(tree: &Tree) -> String {
    let mut out = String::new();
    for id in tree.leaves() {
        let Some(leaf) = tree.leaf(id) else { continue };
        if has_comment(&leaf.trivia) {
            out.push_str(&leaf.trivia);
        }
        if tree.kind(id) == NodeKind::ErrorToken {
            out.push_str(&leaf.text);
            continue;
        }
        let (prefix, suffix) = spacing(tree, id);
        if tree.kind(id) == NodeKind::Newline {
            trim_spaces(&mut out);
        } else if prefix && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(&leaf.text);
        if suffix {
            out.push(' ');
        }
    }
    trim_spaces(&mut out);
    // the parser's trailing newline
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn spacing(tree: &Tree, id: NodeId) -> (bool, bool) {
    let text = tree.text(id);
    let (prefix, mut suffix) = if SPACE_AFTER.contains(&text) {
        (false, true)
    } else if is_tight(tree, id) {
        (false, false)
    } else {
        (true, true)
    };
    if text == ";" {
        let next = tree.next_leaf(id);
        let closes_line = match next {
            None => true,
            Some(n) => tree.kind(n) == NodeKind::Newline || tree.text(n) == ";",
        };
        if closes_line {
            suffix = false;
        }
    }
    (prefix, suffix)
}

fn is_tight(tree: &Tree, id: NodeId) -> bool {
    match tree.kind(id) {
        NodeKind::Name | NodeKind::Number | NodeKind::StringLiteral | NodeKind::Newline => true,
        // sign of a signed atom
        NodeKind::Operator
            if tree
                .parent(id)
                .is_some_and(|p| tree.kind(p) == NodeKind::Atom)
                && !TIGHT.contains(&tree.text(id)) =>
        {
            true
        }
        _ => TIGHT.contains(&tree.text(id)),
    }
}

fn has_comment(trivia: &str) -> bool {
    trivia.contains('#') || trivia.contains("//") || trivia.contains("/*")
}

fn trim_spaces(out: &mut String) {
    let kept = out.trim_end_matches([' ', '\t']).len();
    out.truncate(kept);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn fmt(src: &str) -> String {
        let ctx = Context::new();
        format(&ctx.parse(src))
    }

    #[test]
    fn assignments_and_reactions() {
        assert_eq!(fmt("a=1"), "a = 1");
        assert_eq!(fmt("J0:A->B;k*A"), "J0: A -> B; k * A");
        assert_eq!(fmt("J0 :  A  =>  $B ;  k"), "J0: A => $B; k");
    }

    #[test]
    fn semicolon_spacing() {
        assert_eq!(fmt("a = 1;b = 2"), "a = 1; b = 2");
        assert_eq!(fmt("a = 1;\nb = 2;"), "a = 1;\nb = 2;");
    }

    #[test]
    fn signs_and_parentheses_stay_tight() {
        assert_eq!(fmt("a = - 1"), "a = -1");
        assert_eq!(fmt("a = ( b+c )*d"), "a = (b + c) * d");
        assert_eq!(fmt("k' = 2"), "k' = 2");
    }

    #[test]
    fn declarations() {
        assert_eq!(fmt("const species  x=1 ,y"), "const species x = 1, y");
        assert_eq!(fmt("species s in  c"), "species s in c");
    }

    #[test]
    fn blocks_keep_indentation() {
        assert_eq!(fmt("model m\n  a=1\nend"), "model m\n  a = 1\nend");
    }

    #[test]
    fn comments_are_kept() {
        assert_eq!(fmt("a=1  # one\nb=2"), "a = 1  # one\nb = 2");
    }

    #[test]
    fn error_tokens_are_printed_raw() {
        assert_eq!(fmt("a = %"), "a = %");
    }

    #[test]
    fn formatting_is_idempotent() {
        for src in [
            "J0: 2A+B -> C; k1*A*B\nk1=0.1",
            "model *m(x)\n  x = 3;\nend\nM: m(y)",
            "function f(a,b)\n  a+b\nend",
        ] {
            let once = fmt(src);
            assert_eq!(fmt(&once), once, "{:?}", src);
        }
    }
}
