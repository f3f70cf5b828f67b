//! Configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "schema_dir": "./schemas",
//!   "schema_id": "contracts",
//!   "schema_version": "1",
//!   "fallback_slug": "untitled",
//!   "log_level": "INFO"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contract::{CONTRACT_SCHEMA_ID, CONTRACT_SCHEMA_VERSION};
use crate::observability::Severity;
use crate::schema::{is_slug, DEFAULT_FALLBACK_SLUG};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory of additional `schema_<id>_<version>.json` files
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Schema applied to documents (default: built-in contract schema)
    #[serde(default = "default_schema_id")]
    pub schema_id: String,

    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Slug used when a title yields none
    #[serde(default = "default_fallback_slug")]
    pub fallback_slug: String,

    /// Minimum severity written to the log
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_schema_id() -> String {
    CONTRACT_SCHEMA_ID.to_string()
}
fn default_schema_version() -> String {
    CONTRACT_SCHEMA_VERSION.to_string()
}
fn default_fallback_slug() -> String {
    DEFAULT_FALLBACK_SLUG.to_string()
}
fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: None,
            schema_id: default_schema_id(),
            schema_version: default_schema_version(),
            fallback_slug: default_fallback_slug(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or use defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_id.is_empty() || self.schema_version.is_empty() {
            return Err(CliError::config("schema_id and schema_version must be non-empty"));
        }
        if !is_slug(&self.fallback_slug) {
            return Err(CliError::config(format!(
                "fallback_slug '{}' is not a valid slug",
                self.fallback_slug
            )));
        }
        Ok(())
    }
}
