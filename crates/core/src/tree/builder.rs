//! Turns the automaton's raw values into an arena [`Tree`].
//!
//! One bottom-up pass allocates nodes, computes trunk ranges and sets
//! parent pointers; a second pass over the leaves in document order links
//! the `prev`/`next` chain.

use crate::automaton::{RawTree, RawValue};
use crate::lexer::{Spanned, Token};
use crate::position::Range;

use super::{Leaf, Node, NodeData, NodeId, NodeKind, Tree};

pub(crate) fn build_tree(root: RawTree, tail: String, source_len: usize) -> Tree {
    let mut builder = TreeBuilder { nodes: Vec::new() };
    let root = builder.trunk(root);
    let mut tree = Tree {
        nodes: builder.nodes,
        root,
        first_leaf: None,
        tail,
        source_len,
    };
    link_leaves(&mut tree);
    tree
}

struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn value(&mut self, value: RawValue) -> Option<NodeId> {
        match value {
            v if v.is_dummy() => None,
            RawValue::Token(tok) => {
                let kind = leaf_kind(tok.token);
                Some(self.leaf(kind, tok))
            }
            RawValue::ErrorToken(tok) => Some(self.leaf(NodeKind::ErrorToken, tok)),
            RawValue::Tree(raw) => Some(self.trunk(raw)),
        }
    }

    fn leaf(&mut self, kind: NodeKind, tok: Spanned) -> NodeId {
        self.alloc(Node {
            kind,
            range: tok.range,
            parent: None,
            data: NodeData::Leaf(Leaf {
                text: tok.text,
                trivia: tok.trivia,
                offset: tok.offset,
                prev: None,
                next: None,
            }),
        })
    }

    fn trunk(&mut self, raw: RawTree) -> NodeId {
        let children: Vec<Option<NodeId>> = raw
            .children
            .into_iter()
            .map(|c| c.and_then(|v| self.value(v)))
            .collect();
        let range = Range::cover(children.iter().flatten().map(|c| self.nodes[c.index()].range))
            .unwrap_or_else(Range::empty);
        let id = self.alloc(Node {
            kind: raw.kind,
            range,
            parent: None,
            data: NodeData::Trunk(Vec::new()),
        });
        for child in children.iter().flatten() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].data = NodeData::Trunk(children);
        id
    }
}

fn leaf_kind(token: Token) -> NodeKind {
    match token {
        Token::Name => NodeKind::Name,
        Token::Number => NodeKind::Number,
        Token::Str => NodeKind::StringLiteral,
        Token::Newline => NodeKind::Newline,
        Token::VarModifier => NodeKind::VarModifier,
        Token::SubModifier => NodeKind::SubModifier,
        Token::TypeModifier => NodeKind::TypeModifier,
        Token::In
        | Token::Model
        | Token::End
        | Token::Function
        | Token::Unit
        | Token::Has
        | Token::Is
        | Token::AnnotKeyword => NodeKind::Keyword,
        Token::Invalid | Token::Eof => NodeKind::ErrorToken,
        Token::Semicolon
        | Token::Colon
        | Token::Comma
        | Token::LParen
        | Token::RParen
        | Token::Dollar
        | Token::Prime
        | Token::Arrow
        | Token::Equal
        | Token::ColonEqual
        | Token::Plus
        | Token::Minus
        | Token::Star
        | Token::Slash
        | Token::Caret => NodeKind::Operator,
    }
}

fn link_leaves(tree: &mut Tree) {
    let order: Vec<NodeId> = tree
        .descendants(tree.root)
        .filter(|&id| tree.is_leaf(id))
        .collect();
    tree.first_leaf = order.first().copied();
    for (i, &id) in order.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| order[p]);
        let next = order.get(i + 1).copied();
        if let NodeData::Leaf(leaf) = &mut tree.nodes[id.index()].data {
            leaf.prev = prev;
            leaf.next = next;
        }
    }
}
