//! Cartesian product of group-local permutations.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult, ResourceLimit};
use crate::domain::finder::PermutationGroups;
use crate::domain::tree::{Node, Position, Tree};

/// Caller-supplied bounds on one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Maximum number of trees to produce
    pub max_results: Option<usize>,
    /// Maximum wall-clock time spent expanding
    pub max_duration: Option<Duration>,
    /// Return what was produced so far instead of failing when a limit is hit
    pub truncate: bool,
}

impl ExpansionLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Trees produced by one expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub trees: Vec<Tree>,
    /// True when a limit cut the expansion short
    pub truncated: bool,
}

/// Expand `tree` into every combination of orderings of `groups`.
///
/// Produces exactly the product of the factorials of the group sizes, unless a
/// limit intervenes. With `truncate` unset, exceeding a limit fails with
/// [`DomainError::ResourceExceeded`]; the result-count limit is checked before
/// any tree is built.
#[instrument(level = "debug", skip_all, fields(groups = groups.len()))]
pub fn expand(
    tree: &Tree,
    groups: &PermutationGroups,
    limits: &ExpansionLimits,
) -> DomainResult<Expansion> {
    let required = groups.permutation_count();
    debug!("expand: {:?} trees required", required);

    if let Some(limit) = limits.max_results {
        let exceeds = required.map_or(true, |count| count > limit as u128);
        if exceeds && !limits.truncate {
            return Err(DomainError::ResourceExceeded(ResourceLimit::Results {
                limit,
                required,
            }));
        }
    }

    let mut expander = Expander {
        groups,
        limits,
        started: Instant::now(),
        trees: Vec::new(),
        truncated: false,
    };
    // Depth runs from the last group index down; depth -1 is `remaining == 0`.
    if let ControlFlow::Break(()) = expander.descend(tree.clone(), groups.len())? {
        debug!("expand: stopped early at a limit");
    }

    debug!(
        "expand: produced {} trees, truncated={}",
        expander.trees.len(),
        expander.truncated
    );
    Ok(Expansion {
        trees: expander.trees,
        truncated: expander.truncated,
    })
}

struct Expander<'a> {
    groups: &'a PermutationGroups,
    limits: &'a ExpansionLimits,
    started: Instant,
    trees: Vec<Tree>,
    truncated: bool,
}

impl Expander<'_> {
    fn descend(&mut self, tree: Tree, remaining: usize) -> DomainResult<ControlFlow<()>> {
        if let ControlFlow::Break(()) = self.check_deadline()? {
            return Ok(ControlFlow::Break(()));
        }

        let Some(depth) = remaining.checked_sub(1) else {
            if self
                .limits
                .max_results
                .is_some_and(|limit| self.trees.len() >= limit)
            {
                self.truncated = true;
                return Ok(ControlFlow::Break(()));
            }
            self.trees.push(tree);
            return Ok(ControlFlow::Continue(()));
        };

        let groups = self.groups;
        let group = groups.get(depth).ok_or_else(|| {
            DomainError::InvariantViolation(format!("no permutation group at depth {depth}"))
        })?;
        let contents = group
            .members
            .iter()
            .map(|position| tree.shared_at(position).cloned().ok_or_else(|| unresolved(position)))
            .collect::<DomainResult<Vec<Arc<Node>>>>()?;
        trace!(
            "descend: depth={} parent={} members={}",
            depth,
            group.parent,
            contents.len()
        );

        for ordering in contents.iter().permutations(contents.len()) {
            let mut candidate = tree.clone();
            for (position, node) in group.members.iter().zip(ordering) {
                candidate
                    .set_at(position, Arc::clone(node))
                    .ok_or_else(|| unresolved(position))?;
            }
            if let ControlFlow::Break(()) = self.descend(candidate, depth)? {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn check_deadline(&mut self) -> DomainResult<ControlFlow<()>> {
        let Some(limit) = self.limits.max_duration else {
            return Ok(ControlFlow::Continue(()));
        };
        if self.started.elapsed() < limit {
            return Ok(ControlFlow::Continue(()));
        }
        if self.limits.truncate {
            self.truncated = true;
            Ok(ControlFlow::Break(()))
        } else {
            Err(DomainError::ResourceExceeded(ResourceLimit::Time { limit }))
        }
    }
}

fn unresolved(position: &Position) -> DomainError {
    DomainError::InvariantViolation(format!("group member {position} does not resolve"))
}
