//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/permutree/permutree.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `PERMUTREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::policy::default_tag_groups;
use crate::domain::{
    ConjunctionSet, ExpansionLimits, PermutationPolicy, TagGroup, POLICY_VERSION,
};

/// Parser collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserSettings {
    /// CoreNLP server endpoint
    pub url: String,
    /// Value for CoreNLP's `pipelineLanguage`
    pub language: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            url: "http://corenlp.run/".into(),
            language: "en".into(),
            timeout_secs: 30,
        }
    }
}

/// Bounds applied to every permutation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitSettings {
    /// Maximum number of sentences per request
    pub max_results: Option<usize>,
    /// Maximum expansion time in milliseconds
    pub timeout_ms: Option<u64>,
    /// Return a truncated result instead of failing when a limit is hit
    pub truncate: bool,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_results: Some(10_000),
            timeout_ms: None,
            truncate: false,
        }
    }
}

impl LimitSettings {
    pub fn to_limits(&self) -> ExpansionLimits {
        ExpansionLimits {
            max_results: self.max_results,
            max_duration: self.timeout_ms.map(Duration::from_millis),
            truncate: self.truncate,
        }
    }
}

/// One `[[policy.tag_groups]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagGroupSettings {
    pub name: String,
    pub labels: Vec<String>,
}

/// Serializable form of the permutation policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicySettings {
    pub version: u32,
    pub conjunctions: Vec<String>,
    pub tag_groups: Vec<TagGroupSettings>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION,
            conjunctions: ConjunctionSet::default().labels().map(String::from).collect(),
            tag_groups: default_tag_groups()
                .into_iter()
                .map(|group| TagGroupSettings {
                    name: group.name,
                    labels: group.labels.into_iter().collect(),
                })
                .collect(),
        }
    }
}

impl PolicySettings {
    /// Validate into a domain policy; overlapping tag groups are rejected.
    pub fn to_policy(&self) -> ApplicationResult<PermutationPolicy> {
        let tag_groups = self
            .tag_groups
            .iter()
            .map(|group| TagGroup::new(group.name.clone(), group.labels.iter().cloned()))
            .collect();
        Ok(PermutationPolicy::new(
            self.version,
            ConjunctionSet::new(self.conjunctions.iter().cloned()),
            tag_groups,
        )?)
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub parser: RawParserSettings,
    pub limits: RawLimitSettings,
    pub policy: Option<PolicySettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawParserSettings {
    pub url: Option<String>,
    pub language: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLimitSettings {
    pub max_results: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub truncate: Option<bool>,
}

/// Unified configuration for permutree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub parser: ParserSettings,
    pub limits: LimitSettings,
    pub policy: PolicySettings,
}

/// Get the XDG config directory for permutree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "permutree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("permutree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay specified values onto self. The policy is replaced as a whole.
    fn merge_with(&self, overlay: RawSettings) -> Self {
        Self {
            parser: ParserSettings {
                url: overlay.parser.url.unwrap_or_else(|| self.parser.url.clone()),
                language: overlay
                    .parser
                    .language
                    .unwrap_or_else(|| self.parser.language.clone()),
                timeout_secs: overlay
                    .parser
                    .timeout_secs
                    .unwrap_or(self.parser.timeout_secs),
            },
            limits: LimitSettings {
                max_results: overlay.limits.max_results.or(self.limits.max_results),
                timeout_ms: overlay.limits.timeout_ms.or(self.limits.timeout_ms),
                truncate: overlay.limits.truncate.unwrap_or(self.limits.truncate),
            },
            policy: overlay.policy.unwrap_or_else(|| self.policy.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file that overrides the global one
    ///
    /// # Errors
    /// A missing or unparsable local file, an unparsable global file, or an
    /// environment variable of the wrong type.
    pub fn load(local: Option<&Path>) -> ApplicationResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                current = current.merge_with(load_raw_settings(&global_path)?);
            }
        }

        if let Some(local_path) = local {
            debug!("load: local config {}", local_path.display());
            current = current.merge_with(load_raw_settings(local_path)?);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply PERMUTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PERMUTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("parser.url") {
            settings.parser.url = val;
        }
        if let Ok(val) = config.get_string("parser.language") {
            settings.parser.language = val;
        }
        if let Some(val) = optional(config.get::<u64>("parser.timeout_secs"))? {
            settings.parser.timeout_secs = val;
        }
        if let Some(val) = optional(config.get::<usize>("limits.max_results"))? {
            settings.limits.max_results = Some(val);
        }
        if let Some(val) = optional(config.get::<u64>("limits.timeout_ms"))? {
            settings.limits.timeout_ms = Some(val);
        }
        if let Some(val) = optional(config.get_bool("limits.truncate"))? {
            settings.limits.truncate = val;
        }

        Ok(settings)
    }

    /// Render as TOML (for `config show`).
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}

/// Treat an absent key as `None`, a badly typed one as an error.
fn optional<T>(result: Result<T, ConfigError>) -> ApplicationResult<Option<T>> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}
