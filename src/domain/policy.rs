//! Which labels may be permuted and which labels may sit between them.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::error::{DomainError, DomainResult};

/// Current policy format version.
pub const POLICY_VERSION: u32 = 1;

/// A named set of constituent labels that are interchangeable for permutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup {
    pub name: String,
    pub labels: BTreeSet<String>,
}

impl TagGroup {
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// Labels that may appear between two permutable siblings without ending the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjunctionSet(BTreeSet<String>);

impl ConjunctionSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ConjunctionSet {
    fn default() -> Self {
        Self::new([",", "CC"])
    }
}

/// Validated permutation policy handed to the group finder.
///
/// Tag groups are pairwise disjoint and share no label with the conjunctions;
/// construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationPolicy {
    version: u32,
    conjunctions: ConjunctionSet,
    tag_groups: Vec<TagGroup>,
}

impl PermutationPolicy {
    pub fn new(
        version: u32,
        conjunctions: ConjunctionSet,
        tag_groups: Vec<TagGroup>,
    ) -> DomainResult<Self> {
        if version != POLICY_VERSION {
            return Err(DomainError::UnsupportedPolicyVersion(version));
        }

        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for group in &tag_groups {
            if group.labels.is_empty() {
                return Err(DomainError::EmptyTagGroup(group.name.clone()));
            }
            for label in &group.labels {
                if conjunctions.contains(label) {
                    return Err(DomainError::ConjunctionInTagGroup {
                        label: label.clone(),
                        group: group.name.clone(),
                    });
                }
                if let Some(first) = owners.insert(label.as_str(), group.name.as_str()) {
                    return Err(DomainError::OverlappingTagGroups {
                        label: label.clone(),
                        first: first.to_string(),
                        second: group.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            version,
            conjunctions,
            tag_groups,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn conjunctions(&self) -> &ConjunctionSet {
        &self.conjunctions
    }

    pub fn tag_groups(&self) -> &[TagGroup] {
        &self.tag_groups
    }
}

impl Default for PermutationPolicy {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION,
            conjunctions: ConjunctionSet::default(),
            tag_groups: default_tag_groups(),
        }
    }
}

/// Built-in tag groups for Penn Treebank labels.
pub fn default_tag_groups() -> Vec<TagGroup> {
    vec![
        TagGroup::new("nominal", ["NP", "NN", "NNS", "NNP", "N"]),
        TagGroup::new("adjectival", ["ADJP"]),
        TagGroup::new("mixed", ["UCP"]),
        TagGroup::new("clausal", ["S"]),
        TagGroup::new("verbal", ["VP", "VBG"]),
    ]
}
