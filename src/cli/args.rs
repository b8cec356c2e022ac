//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::IdScheme;

/// Process tree editor: build and edit annotated process trees from edit scripts
#[derive(Parser, Debug)]
#[command(name = "proctree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, env = "PROCTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Id scheme for new nodes: uuid or sequential (overrides config)
    #[arg(long, global = true)]
    pub ids: Option<IdScheme>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the initial tree built from the templates
    Show,

    /// Run the example editing scenario, printing every step
    Demo,

    /// Apply an edit script to a fresh tree and print the result
    Edit {
        /// Script file (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        script: Option<PathBuf>,
        /// Check tree invariants after the last command
        #[arg(long)]
        verify: bool,
    },

    /// Print effective settings as TOML
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
