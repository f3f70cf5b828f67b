//! CLI argument definitions using clap
//!
//! Commands:
//! - contracts insert --actor <id>
//! - contracts update --actor <id> --stored <path>
//! - contracts validate
//! - contracts schema
//!
//! Documents are read from stdin; one JSON response is written to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contract schema engine: defaults and validation for contract documents
#[derive(Parser, Debug)]
#[command(name = "contracts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compute defaults for a new contract and validate it
    Insert {
        /// Identity of the acting user
        #[arg(long)]
        actor: String,
    },

    /// Apply changes from stdin to a stored contract and validate the result
    Update {
        /// Identity of the acting user
        #[arg(long)]
        actor: String,

        /// File holding the stored contract document
        #[arg(long)]
        stored: PathBuf,
    },

    /// Validate a complete document without computing defaults
    Validate,

    /// Print the active schema as JSON
    Schema,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
