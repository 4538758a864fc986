//! Domain layer: tree model and the permutation engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod combinator;
pub mod error;
pub mod finder;
pub mod policy;
pub mod render;
pub mod tree;

pub use combinator::{expand, Expansion, ExpansionLimits};
pub use error::{DomainError, DomainResult, ResourceLimit};
pub use finder::{find_permutable_groups, PermutationGroup, PermutationGroups};
pub use policy::{ConjunctionSet, PermutationPolicy, TagGroup, POLICY_VERSION};
pub use render::{render, render_all, render_node};
pub use tree::{Node, Position, Tree};
