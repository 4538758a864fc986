//! Integration tests for Settings loading and policy wiring.
//!
//! These tests assume no global config file is present, so a `--config` file
//! is layered directly over the compiled defaults.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use permutree::application::services::InputMode;
use permutree::application::ApplicationError;
use permutree::config::Settings;
use permutree::domain::DomainError;
use permutree::infrastructure::di::ServiceContainer;
use permutree::infrastructure::traits::{ParseFailure, SentenceParser};

struct NoParser;

impl SentenceParser for NoParser {
    fn parse(&self, _sentence: &str) -> Result<String, ParseFailure> {
        Err(ParseFailure::Transport("offline".into()))
    }
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("permutree.toml");
    fs::write(&path, content).unwrap();
    path
}

// ============================================================
// Settings::load() tests
// ============================================================

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[parser]
url = "http://localhost:9000/"
timeout_secs = 5

[limits]
max_results = 100
truncate = true
"#,
    );

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.parser.url, "http://localhost:9000/");
    assert_eq!(settings.parser.timeout_secs, 5);
    assert_eq!(settings.limits.max_results, Some(100));
    assert!(settings.limits.truncate);
    assert_eq!(settings.policy, Settings::default().policy);
}

#[test]
fn given_missing_local_config_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_invalid_toml_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[limits\nmax_results = ");

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_env_override_when_load_then_env_wins_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[limits]\ntimeout_ms = 10\n");
    std::env::set_var("PERMUTREE_LIMITS__TIMEOUT_MS", "250");

    let settings = Settings::load(Some(&path));
    std::env::remove_var("PERMUTREE_LIMITS__TIMEOUT_MS");

    assert_eq!(settings.unwrap().limits.timeout_ms, Some(250));
}

// ============================================================
// Policy from config
// ============================================================

#[test]
fn given_custom_policy_when_permuting_then_only_configured_groups_are_reordered() {
    // Arrange: adjectives only, so the coordinated NPs stay put
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[policy]
conjunctions = ["CC"]

[[policy.tag_groups]]
name = "adjectival"
labels = ["JJ"]
"#,
    );
    let settings = Settings::load(Some(&path)).unwrap();
    let container = ServiceContainer::with_deps(settings, Arc::new(NoParser)).unwrap();

    // Act
    let result = container
        .permutation
        .permute(
            "(S (NP (NP (NN tea)) (CC and) (NP (JJ hot) (CC and) (JJ sweet) (NN cake))))",
            InputMode::Tree,
        )
        .unwrap();

    // Assert
    assert_eq!(
        result.sentences,
        vec!["tea and hot and sweet cake", "tea and sweet and hot cake"]
    );
}

#[test]
fn given_overlapping_tag_groups_when_building_container_then_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[[policy.tag_groups]]
name = "first"
labels = ["NP", "NN"]

[[policy.tag_groups]]
name = "second"
labels = ["NN"]
"#,
    );
    let settings = Settings::load(Some(&path)).unwrap();

    let result = ServiceContainer::with_deps(settings, Arc::new(NoParser));

    assert!(matches!(
        result.err(),
        Some(ApplicationError::Domain(DomainError::OverlappingTagGroups { .. }))
    ));
}

#[test]
fn given_unknown_policy_version_when_building_container_then_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[policy]\nversion = 99\n");
    let settings = Settings::load(Some(&path)).unwrap();

    let result = ServiceContainer::with_deps(settings, Arc::new(NoParser));

    assert!(matches!(
        result.err(),
        Some(ApplicationError::Domain(DomainError::UnsupportedPolicyVersion(99)))
    ));
}
