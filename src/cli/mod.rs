//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::Side;

pub mod commands;

/// Output format for record/report commands.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

/// Which backend a command targets.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideArg {
    /// The hosted list service
    List,
    /// The document store
    Docs,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::List => Self::List,
            SideArg::Docs => Self::Docs,
        }
    }
}

/// Supported completion shells.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// ShareSync CLI - Two-way reconciliation between a hosted list and a document store
#[derive(Parser, Debug)]
#[command(name = "ssync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: ~/.sharesync/config.json)
    #[arg(long, global = true, env = "SSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Per-request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile the two backends (most recently modified wins)
    Sync {
        /// Build and show the plan without applying anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch and show one backend's records
    Fetch {
        /// Backend to fetch from
        #[arg(value_enum)]
        side: SideArg,
    },

    /// Show the most recent sync run report
    Report,

    /// Export one backend's records to a CSV file
    Export {
        /// Backend to export from
        #[arg(value_enum)]
        side: SideArg,

        /// Output file path
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Import records from a CSV file as creates on one backend
    Import {
        /// Backend to create the records on
        #[arg(value_enum)]
        side: SideArg,

        /// Input file path
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}
