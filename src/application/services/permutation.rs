//! Permutation service
//!
//! Turns one request (a sentence or a literal tree) into the sorted list of
//! reordered sentences.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    expand, find_permutable_groups, render_all, ExpansionLimits, PermutationGroups,
    PermutationPolicy, Tree,
};
use crate::infrastructure::traits::SentenceParser;

/// How the request input is to be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Natural-language sentence, parsed by the parser collaborator
    Sentence,
    /// Bracketed tree string
    #[default]
    Tree,
}

/// Result of one permutation request.
#[derive(Debug, Clone)]
pub struct PermutationOutput {
    /// The tree that was expanded (parsed from the sentence in sentence mode)
    pub tree: Tree,
    /// Groups that were reordered
    pub groups: PermutationGroups,
    /// Rendered sentences, sorted ascending, duplicates kept
    pub sentences: Vec<String>,
    /// True when a limit cut the expansion short
    pub truncated: bool,
}

/// Service producing every reordering of coordinated constituents.
pub struct PermutationService {
    parser: Arc<dyn SentenceParser>,
    policy: PermutationPolicy,
    limits: ExpansionLimits,
}

impl PermutationService {
    /// Create a new permutation service.
    pub fn new(
        parser: Arc<dyn SentenceParser>,
        policy: PermutationPolicy,
        limits: ExpansionLimits,
    ) -> Self {
        Self {
            parser,
            policy,
            limits,
        }
    }

    /// Obtain the tree for `input`, consulting the parser in sentence mode.
    #[instrument(level = "debug", skip(self, input))]
    pub fn resolve_tree(&self, input: &str, mode: InputMode) -> ApplicationResult<Tree> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ApplicationError::EmptyInput);
        }

        let tree_text = match mode {
            InputMode::Tree => input.to_string(),
            InputMode::Sentence => {
                let parsed = self.parser.parse(input)?;
                debug!("resolve_tree: parser returned {} bytes", parsed.len());
                parsed
            }
        };
        Ok(Tree::parse(&tree_text)?)
    }

    /// Permutation groups of the tree for `input`.
    pub fn groups(
        &self,
        input: &str,
        mode: InputMode,
    ) -> ApplicationResult<(Tree, PermutationGroups)> {
        let tree = self.resolve_tree(input, mode)?;
        let groups = find_permutable_groups(&tree, &self.policy);
        Ok((tree, groups))
    }

    /// Every sentence obtainable by reordering the coordinated constituents of `input`.
    #[instrument(level = "debug", skip(self, input))]
    pub fn permute(&self, input: &str, mode: InputMode) -> ApplicationResult<PermutationOutput> {
        let tree = self.resolve_tree(input, mode)?;
        self.permute_tree(tree)
    }

    /// Same as [`permute`](Self::permute) for an already parsed tree.
    pub fn permute_tree(&self, tree: Tree) -> ApplicationResult<PermutationOutput> {
        let groups = find_permutable_groups(&tree, &self.policy);
        let expansion = expand(&tree, &groups, &self.limits)?;
        let sentences = render_all(&expansion.trees);
        info!(
            "permute: {} groups, {} sentences, truncated={}",
            groups.len(),
            sentences.len(),
            expansion.truncated
        );

        Ok(PermutationOutput {
            tree,
            groups,
            sentences,
            truncated: expansion.truncated,
        })
    }
}
