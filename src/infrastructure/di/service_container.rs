//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::PermutationService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{CoreNlpParser, SentenceParser};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Parser collaborator
    pub parser: Arc<dyn SentenceParser>,

    pub permutation: PermutationService,
}

impl ServiceContainer {
    /// Create a new service container with the CoreNLP parser.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let parser = Arc::new(CoreNlpParser::new(&settings.parser)?);
        Ok(Self::with_deps(settings, parser)?)
    }

    /// Create a service container with custom dependencies (for testing).
    ///
    /// Fails if the configured permutation policy is invalid.
    pub fn with_deps(
        settings: Settings,
        parser: Arc<dyn SentenceParser>,
    ) -> ApplicationResult<Self> {
        let policy = settings.policy.to_policy()?;
        let permutation = PermutationService::new(parser.clone(), policy, settings.limits.to_limits());

        Ok(Self {
            settings: Arc::new(settings),
            parser,
            permutation,
        })
    }
}
