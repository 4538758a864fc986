//! Reorder coordinated constituents of a constituency parse tree.
//!
//! Given a bracketed tree such as
//! `(S (NP (NP (NN A)) (, ,) (NP (NN B)) (CC and) (NP (NN C))) (VP (VBD met)))`,
//! permutree finds sibling chains joined by conjunctions and produces every
//! sentence obtainable by reordering the members of each chain.
//!
//! ```
//! use permutree::domain::{expand, find_permutable_groups, render_all};
//! use permutree::domain::{ExpansionLimits, PermutationPolicy, Tree};
//!
//! let tree = Tree::parse("(S (NP (NP (NN tea)) (CC and) (NP (NN cake))) (VP (VBD arrived)))").unwrap();
//! let groups = find_permutable_groups(&tree, &PermutationPolicy::default());
//! let expansion = expand(&tree, &groups, &ExpansionLimits::unbounded()).unwrap();
//!
//! assert_eq!(
//!     render_all(&expansion.trees),
//!     vec!["cake and tea arrived", "tea and cake arrived"]
//! );
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
