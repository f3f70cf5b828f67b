//! CLI command implementations
//!
//! Every command follows the same sequence:
//! 1. Load configuration (or defaults)
//! 2. Register the built-in contract schema and any on-disk schemas
//! 3. Read the input document, run the pipeline, write one response
//!
//! A rejected document still produces a response on stdout; the command
//! then returns `CliError::Rejected` so the process exits non-zero.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use crate::contract::{contract_schema, Accepted, ContractPipeline};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{
    validate as validate_document, DefaultComputer, DerivationNotice, Operation, Schema,
    SchemaLoader, ValidationErrors,
};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_rejection, write_response};

/// Parse arguments and run against stdin/stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_command(
        cli.config.as_deref(),
        cli.command,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
}

/// Run a command with explicit input and output
pub fn run_command<R: Read, W: Write>(
    config_path: Option<&Path>,
    cmd: Command,
    input: &mut R,
    output: &mut W,
) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    Logger::set_min_severity(config.log_level);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("schema_id", config.schema_id.as_str()),
            ("schema_version", config.schema_version.as_str()),
        ],
    );

    let loader = load_schemas(&config)?;
    let schema = loader.resolve(&config.schema_id, &config.schema_version)?;

    match cmd {
        Command::Insert { actor } => insert(&config, schema, &actor, input, output),
        Command::Update { actor, stored } => {
            update(&config, schema, &actor, &stored, input, output)
        }
        Command::Validate => validate(schema, input, output),
        Command::Schema => export_schema(schema, output),
    }
}

/// Built-in contract schema plus everything in `schema_dir`
fn load_schemas(config: &Config) -> CliResult<SchemaLoader> {
    let mut loader = match &config.schema_dir {
        Some(dir) => SchemaLoader::new(dir),
        None => SchemaLoader::in_memory(),
    };
    loader.register(contract_schema())?;

    if let Err(e) = loader.load_all() {
        let error = e.to_string();
        log_event_with_fields(Event::SchemaLoadFailed, &[("error", error.as_str())]);
        return Err(e.into());
    }

    let count = loader.schema_count().to_string();
    log_event_with_fields(Event::SchemasLoaded, &[("count", count.as_str())]);
    Ok(loader)
}

fn pipeline(config: &Config, schema: &Schema) -> ContractPipeline {
    ContractPipeline::with_computer(
        schema.clone(),
        DefaultComputer::default().with_fallback_slug(config.fallback_slug.clone()),
    )
}

/// Compute defaults for a new contract and validate it
pub fn insert<R: Read, W: Write>(
    config: &Config,
    schema: &Schema,
    actor: &str,
    input: &mut R,
    output: &mut W,
) -> CliResult<()> {
    let candidate = read_document(input)?;
    let result = pipeline(config, schema).insert(candidate, actor);
    finish(result, Operation::Insert, output)
}

/// Merge changes into a stored contract and validate the result
pub fn update<R: Read, W: Write>(
    config: &Config,
    schema: &Schema,
    actor: &str,
    stored_path: &Path,
    input: &mut R,
    output: &mut W,
) -> CliResult<()> {
    let stored: Value = serde_json::from_str(&fs::read_to_string(stored_path)?)?;
    let changes = read_document(input)?;
    let result = pipeline(config, schema).update(&stored, changes, actor);
    finish(result, Operation::Update, output)
}

/// Validate a complete document as-is
pub fn validate<R: Read, W: Write>(schema: &Schema, input: &mut R, output: &mut W) -> CliResult<()> {
    let document = read_document(input)?;
    match validate_document(document, schema) {
        Ok(valid) => write_response(output, valid.into_value()),
        Err(errors) => reject(errors, "validate", output),
    }
}

/// Print the schema definition
pub fn export_schema<W: Write>(schema: &Schema, output: &mut W) -> CliResult<()> {
    write_response(output, serde_json::to_value(schema)?)?;
    log_event_with_fields(
        Event::SchemaExported,
        &[
            ("schema_id", schema.schema_id.as_str()),
            ("schema_version", schema.schema_version.as_str()),
        ],
    );
    Ok(())
}

fn finish<W: Write>(
    result: Result<Accepted, ValidationErrors>,
    operation: Operation,
    output: &mut W,
) -> CliResult<()> {
    let accepted = match result {
        Ok(accepted) => accepted,
        Err(errors) => return reject(errors, operation.as_str(), output),
    };

    for notice in &accepted.notices {
        match notice {
            DerivationNotice::MalformedSlugSource { field, source } => {
                log_event_with_fields(
                    Event::SlugFallback,
                    &[("field", field.as_str()), ("source", source.as_str())],
                );
            }
        }
    }

    let mut fields = vec![("op", operation.as_str())];
    if let Some(keyword) = accepted.document.get("keyword").and_then(Value::as_str) {
        fields.push(("keyword", keyword));
    }
    log_event_with_fields(Event::ContractAccepted, &fields);
    write_response(output, accepted.document.into_value())
}

fn reject<W: Write>(errors: ValidationErrors, op: &str, output: &mut W) -> CliResult<()> {
    let count = errors.len().to_string();
    log_event_with_fields(
        Event::ContractRejected,
        &[("op", op), ("violations", count.as_str())],
    );
    write_rejection(output, &errors)?;
    Err(CliError::Rejected(errors.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, SchemaErrorCode};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn run(config: Option<&Path>, cmd: Command, input: &str) -> (CliResult<()>, Value) {
        let mut out = Vec::new();
        let result = run_command(config, cmd, &mut input.as_bytes(), &mut out);
        let response = if out.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&out).unwrap()
        };
        (result, response)
    }

    #[test]
    fn test_insert_minimal_contract() {
        let (result, response) = run(
            None,
            Command::Insert { actor: "u1".into() },
            r#"{"title": "New Policy"}"#,
        );
        result.unwrap();
        assert_eq!(response["status"], "ok");
        assert_eq!(response["data"]["keyword"], "new-policy");
        assert_eq!(response["data"]["url"], "/vote/new-policy");
        assert_eq!(response["data"]["stage"], "DRAFT");
    }

    #[test]
    fn test_insert_rejection_lists_violations() {
        let (result, response) = run(
            None,
            Command::Insert { actor: "u1".into() },
            r#"{"title": "T", "stage": "ARCHIVED", "anonymous": "no"}"#,
        );
        assert!(matches!(result, Err(CliError::Rejected(2))));
        assert_eq!(response["status"], "error");
        assert_eq!(response["violations"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_update_from_stored_file() {
        let dir = TempDir::new().unwrap();
        let (result, inserted) = run(
            None,
            Command::Insert { actor: "u1".into() },
            r#"{"title": "New Policy"}"#,
        );
        result.unwrap();
        let stored = dir.path().join("stored.json");
        fs::write(&stored, inserted["data"].to_string()).unwrap();

        let (result, response) = run(
            None,
            Command::Update {
                actor: "u2".into(),
                stored: stored.clone(),
            },
            r#"{"signatures": [{"role": "ENDORSER"}]}"#,
        );
        result.unwrap();
        assert_eq!(response["data"]["signatures"][0]["_id"], "u2");
        assert_eq!(response["data"]["keyword"], "new-policy");
    }

    #[test]
    fn test_validate_does_not_fill_defaults() {
        let (result, response) = run(None, Command::Validate, r#"{"title": "New Policy"}"#);
        assert!(matches!(result, Err(CliError::Rejected(n)) if n > 1));
        let paths: Vec<_> = response["violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["path"].as_str().unwrap().to_string())
            .collect();
        assert!(paths.contains(&"keyword".to_string()));
    }

    #[test]
    fn test_schema_export() {
        let (result, response) = run(None, Command::Schema, "");
        result.unwrap();
        assert_eq!(response["data"]["schema_id"], "contracts");
        assert_eq!(response["data"]["fields"]["stage"]["type"], "enum");
    }

    #[test]
    fn test_config_selects_on_disk_schema() {
        let dir = TempDir::new().unwrap();
        let schema_dir = dir.path().join("schemas");
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldDef::required_string());
        SchemaLoader::new(&schema_dir)
            .save_schema(&Schema::new("members", "2", fields))
            .unwrap();

        let config_path = dir.path().join("contracts.json");
        fs::write(
            &config_path,
            json!({
                "schema_dir": schema_dir,
                "schema_id": "members",
                "schema_version": "2"
            })
            .to_string(),
        )
        .unwrap();

        let (result, response) = run(Some(&config_path), Command::Validate, r#"{"name": "x"}"#);
        result.unwrap();
        assert_eq!(response["data"]["name"], "x");
    }

    #[test]
    fn test_update_on_disk_schema_uses_its_own_immutable_fields() {
        let dir = TempDir::new().unwrap();
        let schema_dir = dir.path().join("schemas");
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldDef::required_string());
        fields.insert("title".to_string(), FieldDef::optional_string());
        fields.insert("code".to_string(), FieldDef::required_string().immutable());
        SchemaLoader::new(&schema_dir)
            .save_schema(&Schema::new("members", "2", fields))
            .unwrap();

        let config_path = dir.path().join("contracts.json");
        fs::write(
            &config_path,
            json!({
                "schema_dir": schema_dir,
                "schema_id": "members",
                "schema_version": "2"
            })
            .to_string(),
        )
        .unwrap();
        let stored = dir.path().join("stored.json");
        fs::write(&stored, r#"{"name": "x", "code": "c1", "title": "Old"}"#).unwrap();

        // title is only immutable in the contract schema
        let (result, response) = run(
            Some(&config_path),
            Command::Update {
                actor: "u1".into(),
                stored: stored.clone(),
            },
            r#"{"title": "New"}"#,
        );
        result.unwrap();
        assert_eq!(response["data"]["title"], "New");

        let (result, response) = run(
            Some(&config_path),
            Command::Update {
                actor: "u1".into(),
                stored,
            },
            r#"{"code": "c2"}"#,
        );
        assert!(matches!(result, Err(CliError::Rejected(1))));
        assert_eq!(response["violations"][0]["path"], "code");
    }

    #[test]
    fn test_unknown_schema_in_config() {
        let dir = TempDir::new().unwrap();
        let config_path: PathBuf = dir.path().join("contracts.json");
        fs::write(&config_path, r#"{"schema_version": "9"}"#).unwrap();

        let (result, _) = run(Some(&config_path), Command::Schema, "");
        match result {
            Err(CliError::Schema(e)) => assert_eq!(e.code(), SchemaErrorCode::UnknownSchemaVersion),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
