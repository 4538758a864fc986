//! Command dispatch

use std::io::{self, Read};

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::json;
use tracing::{debug, instrument};

use crate::application::services::InputMode;
use crate::cli::args::{Cli, Commands, ConfigCommands, InputArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::render::render_node;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Permute {
            input,
            max_results,
            timeout_ms,
            truncate,
            show_tree,
            json,
        }) => {
            let mut settings = load_settings(cli)?;
            if max_results.is_some() {
                settings.limits.max_results = *max_results;
            }
            if timeout_ms.is_some() {
                settings.limits.timeout_ms = *timeout_ms;
            }
            if *truncate {
                settings.limits.truncate = true;
            }
            _permute(settings, input, *show_tree, *json)
        }
        Some(Commands::Groups { input }) => _groups(load_settings(cli)?, input),
        Some(Commands::Parse { sentence }) => _parse(load_settings(cli)?, sentence),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => _config_show(load_settings(cli)?),
            ConfigCommands::Path => _config_path(cli),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `permutree --help`".into(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    Ok(Settings::load(cli.config.as_deref())?)
}

/// Input text from the argument, or stdin when absent.
fn read_input(input: &InputArgs) -> CliResult<String> {
    match &input.input {
        Some(text) => Ok(text.clone()),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| InfraError::io("read stdin", e))?;
            Ok(text)
        }
    }
}

#[instrument(skip(settings))]
fn _permute(settings: Settings, input: &InputArgs, show_tree: bool, json: bool) -> CliResult<()> {
    let container = ServiceContainer::new(settings)?;
    let text = read_input(input)?;
    let result = container
        .permutation
        .permute(&text, InputMode::from(input.mode))?;
    debug!("_permute: {} sentences", result.sentences.len());

    if json {
        let document = json!({
            "tree": result.tree.to_string(),
            "sentences": result.sentences,
            "truncated": result.truncated,
        });
        let rendered = serde_json::to_string_pretty(&document)
            .map_err(|e| CliError::Usage(format!("cannot encode JSON: {e}")))?;
        output::info(&rendered);
        return Ok(());
    }

    if show_tree {
        output::header("Tree");
        output::info(&result.tree.to_diagram());
        output::header("Permutations");
    }
    for sentence in &result.sentences {
        output::info(sentence);
    }
    if result.truncated {
        output::warning(&format!(
            "output truncated after {} sentences",
            result.sentences.len()
        ));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _groups(settings: Settings, input: &InputArgs) -> CliResult<()> {
    let container = ServiceContainer::new(settings)?;
    let text = read_input(input)?;
    let (tree, groups) = container
        .permutation
        .groups(&text, InputMode::from(input.mode))?;

    if groups.is_empty() {
        output::info("No permutable groups found.");
        return Ok(());
    }
    for (depth, group) in groups.iter().enumerate() {
        output::header(&format!(
            "#{} {} under {}",
            depth, group.tag_group, group.parent
        ));
        for member in &group.members {
            let text = tree
                .subtree_at(member)
                .map(render_node)
                .unwrap_or_default();
            output::detail(&format!("{member}: {text}"));
        }
    }
    let total = groups
        .permutation_count()
        .map(|count| count.to_string())
        .unwrap_or_else(|| "overflow".into());
    output::field("permutations", &total);
    Ok(())
}

#[instrument(skip(settings))]
fn _parse(settings: Settings, sentence: &str) -> CliResult<()> {
    let container = ServiceContainer::new(settings)?;
    let tree = container
        .permutation
        .resolve_tree(sentence, InputMode::Sentence)?;
    output::info(&tree.to_diagram());
    output::info(&tree);
    Ok(())
}

fn _config_show(settings: Settings) -> CliResult<()> {
    output::info(&settings.to_toml()?);
    Ok(())
}

fn _config_path(cli: &Cli) -> CliResult<()> {
    let global = global_config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "unavailable".into());
    output::field("global", &global);
    if let Some(local) = &cli.config {
        output::field("local", &local.display());
    }
    Ok(())
}
