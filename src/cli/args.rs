//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Grow, prune and export exploratory knowledge trees
#[derive(Parser, Debug)]
#[command(name = "knotree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Settings file, layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a script and print the tree as markdown
    Export {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Write to file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Replay a script and print node coordinates
    Layout {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Canvas width (default: fitted to the visible node count)
        #[arg(short, long)]
        width: Option<f64>,
    },

    /// Replay a script and show the tree
    Tree {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
    },

    /// Replay a script and show the most recent actions
    Log {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Number of entries (default: from settings)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Replay a script and list pruned subtrees
    Pruned {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
    },

    /// Replay a script step by step and verify tree invariants
    Check {
        /// Session script (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
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

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show global config path
    Path,
}
