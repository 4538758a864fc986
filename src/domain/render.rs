//! Tree to sentence rendering.

use rayon::prelude::*;

use crate::domain::tree::{Node, Tree};

/// Marks that attach to the preceding token.
pub const PUNCTUATION: [char; 6] = [',', '.', '!', '?', ';', ':'];

/// Surface text of a tree: leaves joined by single spaces, with no space
/// before punctuation.
pub fn render(tree: &Tree) -> String {
    render_node(tree.root())
}

/// Surface text of a single subtree.
pub fn render_node(node: &Node) -> String {
    normalize_spacing(&node.leaves().join(" "))
}

/// Render every tree and sort the sentences ascending.
///
/// Duplicates are kept: distinct trees that read the same appear once each.
pub fn render_all(trees: &[Tree]) -> Vec<String> {
    let mut sentences: Vec<String> = trees.par_iter().map(render).collect();
    sentences.par_sort_unstable();
    sentences
}

fn normalize_spacing(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' && chars.peek().is_some_and(|next| PUNCTUATION.contains(next)) {
            continue;
        }
        normalized.push(c);
    }
    normalized
}
