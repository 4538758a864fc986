//! Discovery of coordinated sibling chains that may be reordered.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::domain::policy::PermutationPolicy;
use crate::domain::tree::{Node, Position, Tree};

/// Sibling positions under one parent that form a coordination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationGroup {
    /// Position of the common parent
    pub parent: Position,
    /// Name of the tag group all members belong to
    pub tag_group: String,
    /// Member positions in order of discovery (always two or more)
    pub members: Vec<Position>,
}

impl PermutationGroup {
    /// Number of orderings of this group's members.
    pub fn permutation_count(&self) -> Option<u128> {
        factorial(self.members.len())
    }
}

/// All permutation groups of a tree, in scheduling order.
///
/// Groups are sorted by parent position (then tag group order) and the index
/// into this collection is the group's depth index. Because an ancestor sorts
/// before its descendants, processing from the last index down reorders nested
/// groups before the groups that contain them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermutationGroups {
    groups: Vec<PermutationGroup>,
}

impl PermutationGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<&PermutationGroup> {
        self.groups.get(depth)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PermutationGroup> {
        self.groups.iter()
    }

    /// Total number of permuted trees, `None` on overflow.
    pub fn permutation_count(&self) -> Option<u128> {
        self.groups
            .iter()
            .try_fold(1u128, |acc, group| acc.checked_mul(group.permutation_count()?))
    }
}

impl<'a> IntoIterator for &'a PermutationGroups {
    type Item = &'a PermutationGroup;
    type IntoIter = std::slice::Iter<'a, PermutationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

fn factorial(n: usize) -> Option<u128> {
    (2..=n as u128).try_fold(1u128, |acc, k| acc.checked_mul(k))
}

/// Find every chain of same-group siblings joined by conjunctions.
///
/// For each tag group, every node carrying one of its labels is taken as a
/// chain start. The walk moves right across conjunction siblings; whenever the
/// node after a conjunction also belongs to the tag group, both ends are
/// recorded under their parent and the walk continues from there. Chains of the
/// same tag group under the same parent end up in one group.
#[instrument(level = "debug", skip_all)]
pub fn find_permutable_groups(tree: &Tree, policy: &PermutationPolicy) -> PermutationGroups {
    let conjunctions = policy.conjunctions();
    let mut found: BTreeMap<(Position, usize), Vec<Position>> = BTreeMap::new();

    for (group_index, group) in policy.tag_groups().iter().enumerate() {
        let in_group = |node: &Node| node.label().is_some_and(|label| group.contains(label));
        let is_conjunction =
            |node: &Node| node.label().is_some_and(|label| conjunctions.contains(label));

        for (start, _) in tree.subtrees_matching(in_group) {
            let Some(parent) = start.parent() else {
                continue;
            };

            let mut cursor = tree.right_sibling(&start);
            while let Some(link) = cursor.filter(|p| tree.subtree_at(p).is_some_and(is_conjunction))
            {
                let next = tree.right_sibling(&link);
                if let Some(member) = next
                    .as_ref()
                    .filter(|p| tree.subtree_at(p).is_some_and(in_group))
                {
                    let members = found.entry((parent.clone(), group_index)).or_default();
                    if !members.contains(&start) {
                        members.push(start.clone());
                    }
                    // Reached only from its nearest left member: the walk stops
                    // at `member`, which cannot also be a conjunction.
                    members.push(member.clone());
                }
                cursor = next;
            }
        }
    }

    let groups: Vec<PermutationGroup> = found
        .into_iter()
        .map(|((parent, group_index), members)| PermutationGroup {
            parent,
            tag_group: policy.tag_groups()[group_index].name.clone(),
            members,
        })
        .collect();

    debug!(
        "find_permutable_groups: {} groups, sizes {:?}",
        groups.len(),
        groups.iter().map(|g| g.members.len()).collect::<Vec<_>>()
    );
    PermutationGroups { groups }
}
