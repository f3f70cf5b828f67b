//! Schema registry
//!
//! - Schemas are keyed by (schema_id, schema_version)
//! - A registered version is immutable; re-registering it is rejected
//! - Schemas can be loaded from a directory of `schema_<id>_<version>.json`
//!   files, and saved back to it

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;
use super::validator::SchemaValidator;

/// Schema registry with an optional backing directory.
pub struct SchemaLoader {
    /// Directory containing schema files
    schema_dir: Option<PathBuf>,
    /// Loaded schemas indexed by (schema_id, schema_version)
    schemas: HashMap<(String, String), Schema>,
}

impl SchemaLoader {
    /// Creates a registry backed by `schema_dir`.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: Some(schema_dir.into()),
            schemas: HashMap::new(),
        }
    }

    /// Creates a registry with no backing directory.
    pub fn in_memory() -> Self {
        Self {
            schema_dir: None,
            schemas: HashMap::new(),
        }
    }

    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Loads all schema files from the schema directory.
    ///
    /// A missing directory loads nothing. Malformed files are FATAL.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        let Some(dir) = self.schema_dir.clone() else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            SchemaError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_schema_file(path)?;
        }
        Ok(paths.len())
    }

    /// Loads a single schema file.
    fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: Schema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(path.display().to_string(), e))?;

        self.insert(schema)
    }

    /// Registers a schema directly.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema("<in-memory>", e))?;
        self.insert(schema)
    }

    fn insert(&mut self, schema: Schema) -> SchemaResult<()> {
        let key = (schema.schema_id.clone(), schema.schema_version.clone());
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }
        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Gets a schema by ID and version.
    pub fn get(&self, schema_id: &str, schema_version: &str) -> Option<&Schema> {
        self.schemas
            .get(&(schema_id.to_string(), schema_version.to_string()))
    }

    /// Gets a schema, distinguishing unknown id from unknown version.
    pub fn resolve(&self, schema_id: &str, schema_version: &str) -> SchemaResult<&Schema> {
        if !self.schema_id_exists(schema_id) {
            return Err(SchemaError::unknown_schema(schema_id));
        }
        self.get(schema_id, schema_version)
            .ok_or_else(|| SchemaError::unknown_version(schema_id, schema_version))
    }

    /// Validator bound to a registered schema.
    pub fn validator(&self, schema_id: &str, schema_version: &str) -> SchemaResult<SchemaValidator<'_>> {
        self.resolve(schema_id, schema_version).map(SchemaValidator::new)
    }

    pub fn exists(&self, schema_id: &str, schema_version: &str) -> bool {
        self.get(schema_id, schema_version).is_some()
    }

    /// Checks if any version of a schema ID exists.
    pub fn schema_id_exists(&self, schema_id: &str) -> bool {
        self.schemas.keys().any(|(id, _)| id == schema_id)
    }

    pub fn all_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Saves a schema to the backing directory.
    pub fn save_schema(&self, schema: &Schema) -> SchemaResult<PathBuf> {
        let dir = self.schema_dir.as_ref().ok_or_else(|| {
            SchemaError::malformed_schema("<in-memory>", "registry has no schema directory")
        })?;
        let path = dir.join(format!(
            "schema_{}_{}.json",
            schema.schema_id, schema.schema_version
        ));

        if path.exists() {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        fs::create_dir_all(dir).map_err(|e| {
            SchemaError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to create schema directory: {}", e),
            )
        })?;

        let content = serde_json::to_string_pretty(schema).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}
