//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, unreadable or invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// stdin/stdout or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema registry failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Document rejected; violations were written to stdout
    #[error("Contract rejected with {0} violation(s)")]
    Rejected(usize),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONTRACT_CLI_CONFIG_ERROR",
            CliError::Io(_) => "CONTRACT_CLI_IO_ERROR",
            CliError::Json(_) => "CONTRACT_CLI_JSON_ERROR",
            CliError::Schema(e) => e.code().code(),
            CliError::Rejected(_) => "CONTRACT_VALIDATION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::config("x").code(), "CONTRACT_CLI_CONFIG_ERROR");
        assert_eq!(CliError::Rejected(2).code(), "CONTRACT_VALIDATION_FAILED");
        let e: CliError = SchemaError::unknown_schema("nope").into();
        assert_eq!(e.code(), "CONTRACT_UNKNOWN_SCHEMA");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CliError::Rejected(3).to_string(),
            "Contract rejected with 3 violation(s)"
        );
    }
}
