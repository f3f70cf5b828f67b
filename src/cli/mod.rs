//! CLI module
//!
//! Provides command-line access to the contract pipeline:
//! - insert: compute defaults for a new contract and validate it
//! - update: apply changes to a stored contract and validate the result
//! - validate: validate a complete document without defaults
//! - schema: print the active schema

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{export_schema, insert, run, run_command, update, validate};
pub use config::Config;
pub use errors::{CliError, CliResult};
pub use io::{read_document, write_error, write_rejection, write_response};
