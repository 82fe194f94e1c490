//! CLI argument definitions using clap
//!
//! Commands:
//! - rolecall serve [--config <path>]
//! - rolecall inspect [--config <path>] [--group <id>]
//! - rolecall check [--config <path>]
//! - rolecall pull [--config <path>] [--force]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rolecall - role registry for chat groups
#[derive(Parser, Debug)]
#[command(name = "rolecall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Handle chat commands as JSON lines on stdin, plus HTTP if configured
    Serve {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the stored snapshot
    Inspect {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only this group's roles
        #[arg(long)]
        group: Option<String>,
    },

    /// Verify the stored snapshot decodes; exits non-zero if corrupt
    Check {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replace the local snapshot with the remote copy
    Pull {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite a non-empty local snapshot
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
