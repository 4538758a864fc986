//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (SentenceParser) but are
//! themselves concrete structs, not traits.

mod permutation;

pub use permutation::{InputMode, PermutationOutput, PermutationService};
