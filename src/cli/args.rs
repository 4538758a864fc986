//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::InputMode;

/// Generate every reordering of coordinated constituents in a parse tree
#[derive(Parser, Debug)]
#[command(name = "permutree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, env = "PERMUTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every reordered sentence, sorted
    Permute {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum number of sentences
        #[arg(long)]
        max_results: Option<usize>,

        /// Maximum expansion time in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print a truncated result instead of failing when a limit is hit
        #[arg(long)]
        truncate: bool,

        /// Also print the expanded tree
        #[arg(long)]
        show_tree: bool,

        /// Emit JSON instead of plain lines
        #[arg(long, conflicts_with = "show_tree")]
        json: bool,
    },

    /// List the permutable groups of a tree
    Groups {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Parse a sentence with the configured parser and print the tree
    Parse {
        /// Sentence to parse
        sentence: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Input shared by the tree-consuming subcommands
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Tree string or sentence (read from stdin when omitted)
    pub input: Option<String>,

    /// How to interpret the input
    #[arg(short, long, value_enum, default_value_t = Mode::Tree)]
    pub mode: Mode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Natural-language sentence, parsed by the parser service
    Sentence,
    /// Bracketed parse tree
    Tree,
}

impl From<Mode> for InputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sentence => InputMode::Sentence,
            Mode::Tree => InputMode::Tree,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
