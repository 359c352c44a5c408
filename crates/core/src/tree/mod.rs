//! Lossless syntax tree.
//!
//! Nodes live in an arena owned by [`Tree`]; children are owned through
//! their parent's child list while `parent`, `prev` and `next` are plain
//! index back-pointers. Every leaf keeps the whitespace and comments that
//! precede it, so walking the leaf chain reproduces the parsed text.

pub mod ast;
pub mod builder;

use serde::Serialize;

use crate::position::{Position, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    // ── leaves ──
    Name,
    Number,
    Operator,
    Keyword,
    VarModifier,
    SubModifier,
    TypeModifier,
    StringLiteral,
    Newline,
    ErrorToken,

    // ── trunks ──
    FileNode,
    ErrorNode,
    SimpleStmt,
    SimpleStmtList,
    Model,
    ModularModel,
    Function,
    Parameters,
    Reaction,
    ReactionName,
    SpeciesList,
    Species,
    Assignment,
    RateRule,
    Declaration,
    DeclModifiers,
    DeclItem,
    DeclAssignment,
    Annotation,
    UnitDeclaration,
    UnitAssignment,
    VariableIn,
    IsAssignment,
    ModularModelCall,
    FunctionCall,
    FuncCall,
    NameMaybeIn,
    VarName,
    InComp,
    Sum,
    Product,
    Power,
    Atom,
}

impl NodeKind {
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeKind::Name
                | NodeKind::Number
                | NodeKind::Operator
                | NodeKind::Keyword
                | NodeKind::VarModifier
                | NodeKind::SubModifier
                | NodeKind::TypeModifier
                | NodeKind::StringLiteral
                | NodeKind::Newline
                | NodeKind::ErrorToken
        )
    }

    /// Containers that open a new scope.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Model | NodeKind::ModularModel | NodeKind::Function
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Sum
                | NodeKind::Product
                | NodeKind::Power
                | NodeKind::Atom
                | NodeKind::Number
                | NodeKind::VarName
                | NodeKind::FuncCall
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub text: String,
    /// Whitespace and comments immediately before `text`.
    pub trivia: String,
    /// Byte offset of `text` in the parsed source.
    pub offset: usize,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Leaf(Leaf),
    /// Ordered child slots; `None` marks an absent optional symbol.
    Trunk(Vec<Option<NodeId>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Range,
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    first_leaf: Option<NodeId>,
    /// Trivia after the last leaf.
    tail: String,
    /// Length of the text the caller passed in, before the parser's
    /// trailing newline.
    source_len: usize,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn range(&self, id: NodeId) -> Range {
        self.node(id).range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Leaf(_))
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        match &self.node(id).data {
            NodeData::Leaf(leaf) => Some(leaf),
            NodeData::Trunk(_) => None,
        }
    }

    /// Exact text of a leaf; empty for trunks.
    pub fn text(&self, id: NodeId) -> &str {
        self.leaf(id).map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Child slots of a trunk; empty for leaves.
    pub fn slots(&self, id: NodeId) -> &[Option<NodeId>] {
        match &self.node(id).data {
            NodeData::Trunk(children) => children,
            NodeData::Leaf(_) => &[],
        }
    }

    /// The child in slot `index`, if the slot exists and is filled.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slots(id).get(index).copied().flatten()
    }

    /// Present children in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.slots(id).iter().filter_map(|c| *c)
    }

    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        self.leaf(id).and_then(|l| l.next)
    }

    pub fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        self.leaf(id).and_then(|l| l.prev)
    }

    pub fn first_leaf(&self) -> Option<NodeId> {
        self.first_leaf
    }

    /// All leaves in document order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            tree: self,
            next: self.first_leaf,
        }
    }

    /// `id` and everything below it, pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Last leaf at or below `id`.
    pub fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        if self.is_leaf(id) {
            return Some(id);
        }
        self.slots(id)
            .iter()
            .rev()
            .flatten()
            .find_map(|&c| self.last_leaf(c))
    }

    /// Index of `id` within its parent's slots.
    pub fn slot_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.slots(parent).iter().position(|c| *c == Some(id))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.slot_index(id)?;
        self.slots(parent).get(index + 1).copied().flatten()
    }

    /// Whether `id` is the newline the parser appended after the caller's
    /// text. Recovery may have re-tagged it as an `ErrorToken`, so only
    /// its place and text are checked.
    pub fn is_synthetic_newline(&self, id: NodeId) -> bool {
        self.leaf(id)
            .is_some_and(|l| l.offset >= self.source_len && l.text == "\n")
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Reassemble the parsed text from the leaf chain.
    pub fn source(&self) -> String {
        let mut out = String::with_capacity(self.source_len + 1);
        for id in self.leaves() {
            if let Some(leaf) = self.leaf(id) {
                out.push_str(&leaf.trivia);
                out.push_str(&leaf.text);
            }
        }
        out.push_str(&self.tail);
        out
    }

    /// The innermost node whose range contains `pos`.
    pub fn node_at(&self, pos: Position) -> Option<NodeId> {
        let mut current = self.root;
        if !self.range(current).contains(pos) {
            return None;
        }
        'descend: loop {
            for child in self.children(current) {
                if self.range(child).contains(pos) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Text of the leaves under `id`, with each run of trivia collapsed
    /// into one space.
    pub fn flat_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for leaf in self.descendants(id).filter(|&d| self.is_leaf(d)) {
            let Some(data) = self.leaf(leaf) else { continue };
            if !out.is_empty() && !data.trivia.is_empty() {
                out.push(' ');
            }
            out.push_str(&data.text);
        }
        out
    }

    /// Indented outline of the tree, one node per line.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(self.root, 0, &mut out);
        out
    }

    fn pretty_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        match &node.data {
            NodeData::Leaf(leaf) => {
                out.push_str(&format!("{:?} {:?} {}\n", node.kind, leaf.text, node.range));
            }
            NodeData::Trunk(children) => {
                out.push_str(&format!("{:?} {}\n", node.kind, node.range));
                for child in children {
                    match child {
                        Some(c) => self.pretty_into(*c, depth + 1, out),
                        None => {
                            out.push_str(&"  ".repeat(depth + 1));
                            out.push_str("-\n");
                        }
                    }
                }
            }
        }
    }
}

pub struct Leaves<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl Iterator for Leaves<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_leaf(current);
        Some(current)
    }
}

pub struct Descendants<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.slots(current).iter().rev().flatten().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::position::{Position, Range};
    use crate::tree::NodeKind;

    #[test]
    fn leaf_chain_reproduces_source() {
        let ctx = Context::new();
        let src = "// header\nJ0: A -> B; k1*A  # trailing\n\nmodel m\n  x = 3\nend";
        let tree = ctx.parse(src);
        assert_eq!(tree.source(), format!("{}\n", src));
    }

    #[test]
    fn trunk_range_is_union_of_children() {
        let ctx = Context::new();
        let tree = ctx.parse("a = 1\nbb = 22");
        for id in tree.descendants(tree.root()) {
            if tree.is_leaf(id) {
                continue;
            }
            let cover = Range::cover(tree.children(id).map(|c| tree.range(c)));
            assert_eq!(Some(tree.range(id)), cover.or(Some(Range::empty())));
        }
    }

    #[test]
    fn empty_document_has_degenerate_root() {
        let ctx = Context::new();
        let tree = ctx.parse("");
        assert_eq!(tree.kind(tree.root()), NodeKind::FileNode);
        assert_eq!(tree.source(), "\n");
    }

    #[test]
    fn parents_point_back() {
        let ctx = Context::new();
        let tree = ctx.parse("a = b + c");
        for id in tree.descendants(tree.root()) {
            for child in tree.children(id) {
                assert_eq!(tree.parent(child), Some(id));
            }
        }
        assert_eq!(tree.parent(tree.root()), None);
    }

    #[test]
    fn node_at_finds_innermost() {
        let ctx = Context::new();
        let tree = ctx.parse("abc = def");
        let id = tree.node_at(Position::new(1, 8)).expect("node");
        assert_eq!(tree.kind(id), NodeKind::Name);
        assert_eq!(tree.text(id), "def");
    }

    #[test]
    fn synthetic_newline_is_last_leaf() {
        let ctx = Context::new();
        let tree = ctx.parse("a = 1");
        let last = tree.leaves().last().expect("leaf");
        assert!(tree.is_synthetic_newline(last));
        let first = tree.first_leaf().expect("leaf");
        assert!(!tree.is_synthetic_newline(first));
    }

    #[test]
    fn synthetic_newline_is_found_after_recovery() {
        let ctx = Context::new();
        let tree = ctx.parse("a =");
        let last = tree.leaves().last().expect("leaf");
        assert_eq!(tree.kind(last), NodeKind::ErrorToken);
        assert!(tree.is_synthetic_newline(last));

        // a newline the caller wrote is never synthetic
        let tree = ctx.parse("a =\n");
        let last = tree.leaves().last().expect("leaf");
        assert!(!tree.is_synthetic_newline(last));
    }
}
