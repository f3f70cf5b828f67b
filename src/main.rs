//! contracts CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments and dispatches (via cli::run)
//! 2. Reports errors on stdout as a JSON response and on stderr
//! 3. Exits with non-zero on failure
//!
//! All logic is delegated to the CLI module.

use contracts::cli::{self, CliError};

fn main() {
    if let Err(e) = cli::run() {
        // Rejections already wrote their violation list.
        if !matches!(e, CliError::Rejected(_)) {
            let _ = cli::write_error(&mut std::io::stdout(), e.code(), &e.to_string());
        }
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
