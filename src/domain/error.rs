//! Domain-level errors (no external dependencies)

use std::time::Duration;

use thiserror::Error;

/// Budget that a permutation request ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLimit {
    /// More trees would be produced than the caller allows.
    /// `required` is `None` when the count does not even fit into a `u128`.
    Results { limit: usize, required: Option<u128> },
    /// Expansion ran longer than the caller allows.
    Time { limit: Duration },
}

impl std::fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLimit::Results {
                limit,
                required: Some(required),
            } => write!(f, "{required} permutations requested, limit is {limit}"),
            ResourceLimit::Results {
                limit,
                required: None,
            } => write!(f, "permutation count overflows, limit is {limit}"),
            ResourceLimit::Time { limit } => {
                write!(f, "expansion exceeded {} ms", limit.as_millis())
            }
        }
    }
}

/// Domain errors represent violations of the tree and policy contracts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid tree at offset {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("input too large to expand: {0}")]
    ResourceExceeded(ResourceLimit),

    #[error("label '{label}' belongs to tag groups '{first}' and '{second}'")]
    OverlappingTagGroups {
        label: String,
        first: String,
        second: String,
    },

    #[error("label '{label}' is both a conjunction and in tag group '{group}'")]
    ConjunctionInTagGroup { label: String, group: String },

    #[error("tag group '{0}' has no labels")]
    EmptyTagGroup(String),

    #[error("unsupported policy version: {0}")]
    UnsupportedPolicyVersion(u32),
}

impl DomainError {
    pub(crate) fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
