//! Position-addressable constituency tree.
//!
//! Nodes own their children; there are no parent pointers. Relationships such
//! as "right sibling" are derived from [`Position`]s on demand. Subtrees are
//! reference counted so that [`Tree::replace_at`] can hand out a new tree which
//! shares every untouched subtree with the tree it was derived from.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use termtree::Tree as Diagram;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// Deepest nesting `Tree::parse` accepts. Rendering and dropping recurse once
/// per level.
pub const MAX_DEPTH: usize = 1_000;

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"\(|\)|[^\s()]+").expect("token pattern is valid"))
}

/// Path of child indices from the root. The empty path addresses the root.
///
/// Ordering is lexicographic over the indices, so an ancestor always sorts
/// before its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(Vec<usize>);

impl Position {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Position of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<Position> {
        self.0
            .split_last()
            .map(|(_, rest)| Position(rest.to_vec()))
    }

    /// Index of this node within its parent, `None` for the root.
    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn child(&self, index: usize) -> Position {
        let mut indices = self.0.clone();
        indices.push(index);
        Position(indices)
    }
}

impl From<Vec<usize>> for Position {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Position {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, ")")
    }
}

/// A token or a labelled constituent with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal(String),
    NonTerminal {
        label: String,
        children: Vec<Arc<Node>>,
    },
}

impl Node {
    pub fn terminal(token: impl Into<String>) -> Self {
        Node::Terminal(token.into())
    }

    pub fn non_terminal(label: impl Into<String>, children: Vec<Node>) -> Self {
        Node::NonTerminal {
            label: label.into(),
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    /// Constituent label; terminals have none.
    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Terminal(_) => None,
            Node::NonTerminal { label, .. } => Some(label.as_str()),
        }
    }

    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::Terminal(_) => &[],
            Node::NonTerminal { children, .. } => children.as_slice(),
        }
    }

    /// Tokens below this node, depth-first, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a str>) {
        match self {
            Node::Terminal(token) => leaves.push(token),
            Node::NonTerminal { children, .. } => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    fn to_diagram(&self) -> Diagram<String> {
        match self {
            Node::Terminal(token) => Diagram::new(token.clone()),
            Node::NonTerminal { label, children } => Diagram::new(label.clone())
                .with_leaves(children.iter().map(|child| child.to_diagram())),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Terminal(token) => write!(f, "{token}"),
            Node::NonTerminal { label, children } => {
                write!(f, "({label}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// An immutable constituency tree.
///
/// Cloning is cheap; all structure is shared until a position is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: Arc<Node>,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// Parse bracketed notation such as `(S (NP (DT The) (NN cat)) (VP (VBD ran)))`.
    ///
    /// Whitespace between tokens is insignificant. The input must contain
    /// exactly one top-level node and every `(` must be followed by a label.
    /// Nodes nested deeper than [`MAX_DEPTH`] are rejected.
    #[instrument(level = "debug", skip(input), fields(len = input.len()))]
    pub fn parse(input: &str) -> DomainResult<Self> {
        // (label, children, offset of the opening bracket)
        let mut stack: Vec<(String, Vec<Arc<Node>>, usize)> = Vec::new();
        let mut root: Option<Node> = None;
        let mut tokens = token_re().find_iter(input).peekable();

        while let Some(token) = tokens.next() {
            let offset = token.start();
            match token.as_str() {
                "(" => {
                    if root.is_some() {
                        return Err(DomainError::parse(
                            offset,
                            "unexpected input after the top-level node",
                        ));
                    }
                    let label = match tokens.peek() {
                        Some(next) if !matches!(next.as_str(), "(" | ")") => {
                            next.as_str().to_string()
                        }
                        _ => return Err(DomainError::parse(offset, "node has no label")),
                    };
                    if stack.len() == MAX_DEPTH {
                        return Err(DomainError::parse(
                            offset,
                            format!("nesting deeper than {MAX_DEPTH} levels"),
                        ));
                    }
                    tokens.next();
                    stack.push((label, Vec::new(), offset));
                }
                ")" => {
                    let (label, children, _) = stack
                        .pop()
                        .ok_or_else(|| DomainError::parse(offset, "unbalanced ')'"))?;
                    let node = Node::NonTerminal { label, children };
                    match stack.last_mut() {
                        Some((_, siblings, _)) => siblings.push(Arc::new(node)),
                        None => root = Some(node),
                    }
                }
                word => match stack.last_mut() {
                    Some((_, children, _)) => children.push(Arc::new(Node::terminal(word))),
                    None if root.is_some() => {
                        return Err(DomainError::parse(
                            offset,
                            "unexpected input after the top-level node",
                        ))
                    }
                    None => {
                        return Err(DomainError::parse(
                            offset,
                            format!("token '{word}' outside of any node"),
                        ))
                    }
                },
            }
        }

        if let Some((label, _, offset)) = stack.pop() {
            return Err(DomainError::parse(
                offset,
                format!("unclosed '(' for node '{label}'"),
            ));
        }
        let root = root.ok_or_else(|| DomainError::parse(0, "empty tree"))?;
        trace!("parsed tree: {}", root);
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Node addressed by `position`, if it resolves.
    pub fn subtree_at(&self, position: &Position) -> Option<&Node> {
        self.shared_at(position).map(|node| node.as_ref())
    }

    /// Shared handle to the node at `position`; cloning it does not copy the subtree.
    pub fn shared_at(&self, position: &Position) -> Option<&Arc<Node>> {
        let mut current = &self.root;
        for &index in position.indices() {
            current = current.children().get(index)?;
        }
        Some(current)
    }

    /// New tree where only the content at `position` differs.
    ///
    /// `self` is left untouched; untouched subtrees are shared between both trees.
    /// Returns `None` if `position` does not resolve.
    pub fn replace_at(&self, position: &Position, node: impl Into<Arc<Node>>) -> Option<Tree> {
        let mut replaced = self.clone();
        replaced.set_at(position, node.into())?;
        Some(replaced)
    }

    /// Substitute content in place, copying only the nodes on the path to
    /// `position` that are still shared with other trees.
    pub(crate) fn set_at(&mut self, position: &Position, node: Arc<Node>) -> Option<()> {
        let Some((&last, path)) = position.indices().split_last() else {
            self.root = node;
            return Some(());
        };
        let mut current = &mut self.root;
        for &index in path {
            current = match Arc::make_mut(current) {
                Node::NonTerminal { children, .. } => children.get_mut(index)?,
                Node::Terminal(_) => return None,
            };
        }
        match Arc::make_mut(current) {
            Node::NonTerminal { children, .. } => {
                *children.get_mut(last)? = node;
                Some(())
            }
            Node::Terminal(_) => None,
        }
    }

    /// Tokens of the whole tree, depth-first, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        self.root.leaves()
    }

    /// Position of the next sibling to the right, if any.
    pub fn right_sibling(&self, position: &Position) -> Option<Position> {
        let parent = position.parent()?;
        let next = position.last_index()? + 1;
        let siblings = self.subtree_at(&parent)?.children();
        (next < siblings.len()).then(|| parent.child(next))
    }

    /// Pre-order iterator over every node together with its position.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(Position::root(), self.root.as_ref())],
        }
    }

    /// All nodes satisfying `predicate`, in pre-order.
    pub fn subtrees_matching<P>(&self, predicate: P) -> Vec<(Position, &Node)>
    where
        P: Fn(&Node) -> bool,
    {
        self.iter().filter(|(_, node)| predicate(node)).collect()
    }

    /// Tree diagram suitable for terminal display.
    pub fn to_diagram(&self) -> Diagram<String> {
        self.root.to_diagram()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

pub struct PreOrder<'a> {
    stack: Vec<(Position, &'a Node)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (Position, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (position, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for (index, child) in node.children().iter().enumerate().rev() {
            self.stack.push((position.child(index), child.as_ref()));
        }
        Some((position, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CAT_AND_DOG: &str = "(S (NP (NP (DT The) (NN cat)) (, ,) (CC and) (NP (DT the) (NN dog))) (VP (VBD ran)) (. .))";

    fn pos(indices: &[usize]) -> Position {
        Position::from(indices)
    }

    #[test]
    fn given_bracketed_tree_when_parsing_then_builds_labels_and_leaves() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        assert_eq!(tree.root().label(), Some("S"));
        assert_eq!(
            tree.leaves(),
            vec!["The", "cat", ",", "and", "the", "dog", "ran", "."]
        );
        assert_eq!(tree.subtree_at(&pos(&[0, 1])).unwrap().label(), Some(","));
    }

    #[test]
    fn given_multiline_tree_when_parsing_then_whitespace_is_ignored() {
        let tree = Tree::parse("\n(ROOT\n  (S\n    (NP (NN it))\n    (VP (VBZ works))))\n").unwrap();

        assert_eq!(tree.to_string(), "(ROOT (S (NP (NN it)) (VP (VBZ works))))");
    }

    #[rstest]
    #[case::empty("", "empty tree")]
    #[case::blank("   ", "empty tree")]
    #[case::unclosed("(S (NP (NN cat))", "unclosed")]
    #[case::extra_close("(S (NN cat)))", "unbalanced")]
    #[case::missing_label("(S ( (NN cat)))", "no label")]
    #[case::label_is_close("(S ())", "no label")]
    #[case::two_roots("(S (NN a)) (S (NN b))", "after the top-level node")]
    #[case::trailing_token("(S (NN a)) b", "after the top-level node")]
    #[case::bare_token("cat", "outside of any node")]
    fn given_malformed_input_when_parsing_then_fails_with_parse_error(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let err = Tree::parse(input).unwrap_err();

        match &err {
            DomainError::Parse { reason, .. } => {
                assert!(reason.contains(expected), "unexpected reason: {reason}")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn given_unclosed_node_when_parsing_then_reports_offset_of_opening_bracket() {
        let err = Tree::parse("(S (NP (NN cat)) (VP").unwrap_err();

        assert_eq!(
            err,
            DomainError::Parse {
                offset: 17,
                reason: "unclosed '(' for node 'VP'".into()
            }
        );
    }

    fn nested(depth: usize) -> String {
        format!("{}a{}", "(X ".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn given_nesting_at_limit_when_parsing_then_renders_and_drops() {
        let tree = Tree::parse(&nested(MAX_DEPTH)).unwrap();

        assert_eq!(tree.leaves(), vec!["a"]);
        assert_eq!(tree.to_string(), nested(MAX_DEPTH));
    }

    #[test]
    fn given_nesting_beyond_limit_when_parsing_then_fails_at_offending_bracket() {
        let err = Tree::parse(&nested(100_000)).unwrap_err();

        assert_eq!(
            err,
            DomainError::Parse {
                offset: MAX_DEPTH * 3,
                reason: format!("nesting deeper than {MAX_DEPTH} levels"),
            }
        );
    }

    #[test]
    fn given_parsed_tree_when_displaying_then_round_trips_bracketed_text() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        assert_eq!(tree.to_string(), CAT_AND_DOG);
        assert_eq!(Tree::parse(&tree.to_string()).unwrap(), tree);
    }

    #[test]
    fn given_position_when_replacing_then_original_tree_is_unchanged() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();
        let dog = tree.shared_at(&pos(&[0, 3])).unwrap().clone();

        let replaced = tree.replace_at(&pos(&[0, 0]), dog).unwrap();

        assert_eq!(
            replaced.leaves(),
            vec!["the", "dog", ",", "and", "the", "dog", "ran", "."]
        );
        assert_eq!(
            tree.leaves(),
            vec!["The", "cat", ",", "and", "the", "dog", "ran", "."]
        );
    }

    #[test]
    fn given_replacement_when_comparing_then_untouched_subtrees_are_shared() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        let replaced = tree
            .replace_at(&pos(&[0, 0]), Node::terminal("x"))
            .unwrap();

        let before = tree.shared_at(&pos(&[1])).unwrap();
        let after = replaced.shared_at(&pos(&[1])).unwrap();
        assert!(Arc::ptr_eq(before, after));
    }

    #[test]
    fn given_root_position_when_replacing_then_whole_tree_is_substituted() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        let replaced = tree
            .replace_at(&Position::root(), Node::terminal("x"))
            .unwrap();

        assert_eq!(replaced.leaves(), vec!["x"]);
    }

    #[rstest]
    #[case::out_of_range(&[7])]
    #[case::below_terminal(&[0, 0, 0, 0, 0])]
    fn given_unresolvable_position_when_replacing_then_returns_none(#[case] indices: &[usize]) {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        assert!(tree.subtree_at(&pos(indices)).is_none());
        assert!(tree.replace_at(&pos(indices), Node::terminal("x")).is_none());
    }

    #[rstest]
    #[case(&[0, 0], Some(&[0usize, 1][..]))]
    #[case(&[0, 2], Some(&[0usize, 3][..]))]
    #[case(&[0, 3], None)]
    #[case(&[2], None)]
    #[case(&[], None)]
    fn given_position_when_asking_right_sibling_then_uses_parent_children(
        #[case] indices: &[usize],
        #[case] expected: Option<&[usize]>,
    ) {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        assert_eq!(tree.right_sibling(&pos(indices)), expected.map(pos));
    }

    #[test]
    fn given_predicate_when_matching_subtrees_then_returns_pre_order_positions() {
        let tree = Tree::parse(CAT_AND_DOG).unwrap();

        let found: Vec<_> = tree
            .subtrees_matching(|node| node.label() == Some("NP"))
            .into_iter()
            .map(|(position, _)| position)
            .collect();

        assert_eq!(found, vec![pos(&[0]), pos(&[0, 0]), pos(&[0, 3])]);
    }

    #[test]
    fn given_positions_when_sorting_then_ancestors_come_first() {
        let mut positions = vec![pos(&[1]), pos(&[0, 2]), pos(&[0]), Position::root()];
        positions.sort();

        assert_eq!(
            positions,
            vec![Position::root(), pos(&[0]), pos(&[0, 2]), pos(&[1])]
        );
        assert_eq!(pos(&[0, 2]).to_string(), "(0, 2)");
    }

    #[test]
    fn given_tree_when_building_diagram_then_renders_labels_and_tokens() {
        let tree = Tree::parse("(S (NP (NN cat)))").unwrap();

        let diagram = tree.to_diagram().to_string();

        assert!(diagram.starts_with("S\n"));
        assert!(diagram.contains("NN"));
        assert!(diagram.contains("cat"));
    }
}
