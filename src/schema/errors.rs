//! Schema error types
//!
//! Two families live here:
//! - `Violation` / `ValidationErrors`: what is wrong with a document. Always
//!   recoverable; the caller fixes the input and resubmits.
//! - `SchemaError`: what is wrong with the schema registry itself (unknown
//!   schema, immutable version, malformed schema file).
//!
//! Error codes:
//! - CONTRACT_MISSING_REQUIRED
//! - CONTRACT_WRONG_TYPE
//! - CONTRACT_INVALID_ENUM_VALUE
//! - CONTRACT_INVALID_ARRAY_ELEMENT
//! - CONTRACT_UNDECLARED_FIELD
//! - CONTRACT_IMMUTABLE_FIELD
//! - CONTRACT_UNKNOWN_SCHEMA (REJECT)
//! - CONTRACT_UNKNOWN_SCHEMA_VERSION (REJECT)
//! - CONTRACT_SCHEMA_IMMUTABLE (REJECT)
//! - CONTRACT_MALFORMED_SCHEMA (FATAL)

use serde_json::{json, Value};
use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Classification of a single document violation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// Required field absent after defaults were computed
    MissingRequired,
    /// Value shape does not match the declared type
    WrongType { expected: String, actual: String },
    /// Value outside the declared enumeration
    InvalidEnumValue { value: String, allowed: Vec<String> },
    /// An array element failed its sub-schema
    InvalidArrayElement { index: usize, cause: Box<Violation> },
    /// Field not declared in the schema
    UndeclaredField,
    /// Attempt to change a field fixed at creation
    ImmutableField { stored: Value, attempted: Value },
}

impl ViolationKind {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "CONTRACT_MISSING_REQUIRED",
            ViolationKind::WrongType { .. } => "CONTRACT_WRONG_TYPE",
            ViolationKind::InvalidEnumValue { .. } => "CONTRACT_INVALID_ENUM_VALUE",
            ViolationKind::InvalidArrayElement { .. } => "CONTRACT_INVALID_ARRAY_ELEMENT",
            ViolationKind::UndeclaredField => "CONTRACT_UNDECLARED_FIELD",
            ViolationKind::ImmutableField { .. } => "CONTRACT_IMMUTABLE_FIELD",
        }
    }

    /// Short kebab-case label used on the wire
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "missing-required",
            ViolationKind::WrongType { .. } => "wrong-type",
            ViolationKind::InvalidEnumValue { .. } => "invalid-enum-value",
            ViolationKind::InvalidArrayElement { .. } => "invalid-array-element",
            ViolationKind::UndeclaredField => "undeclared-field",
            ViolationKind::ImmutableField { .. } => "immutable-field",
        }
    }
}

/// A single violation: field path, kind and human-readable detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Field path (e.g., "signatures.$.role")
    pub path: String,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn missing_required(path: impl Into<String>) -> Self {
        Self::new(path, ViolationKind::MissingRequired)
    }

    pub fn wrong_type(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            ViolationKind::WrongType {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    pub fn invalid_enum_value(
        path: impl Into<String>,
        value: impl Into<String>,
        allowed: &[String],
    ) -> Self {
        Self::new(
            path,
            ViolationKind::InvalidEnumValue {
                value: value.into(),
                allowed: allowed.to_vec(),
            },
        )
    }

    pub fn invalid_array_element(path: impl Into<String>, index: usize, cause: Violation) -> Self {
        Self::new(
            path,
            ViolationKind::InvalidArrayElement {
                index,
                cause: Box::new(cause),
            },
        )
    }

    pub fn undeclared_field(path: impl Into<String>) -> Self {
        Self::new(path, ViolationKind::UndeclaredField)
    }

    pub fn immutable_field(path: impl Into<String>, stored: Value, attempted: Value) -> Self {
        Self::new(path, ViolationKind::ImmutableField { stored, attempted })
    }

    /// Innermost violation, descending through array elements
    pub fn root_cause(&self) -> &Violation {
        match &self.kind {
            ViolationKind::InvalidArrayElement { cause, .. } => cause.root_cause(),
            _ => self,
        }
    }

    /// Element index if this violation is about an array element
    pub fn index(&self) -> Option<usize> {
        match &self.kind {
            ViolationKind::InvalidArrayElement { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Human-readable detail
    pub fn detail(&self) -> String {
        match &self.kind {
            ViolationKind::MissingRequired => "required field is missing".to_string(),
            ViolationKind::WrongType { expected, actual } => {
                format!("expected {}, got {}", expected, actual)
            }
            ViolationKind::InvalidEnumValue { value, allowed } => {
                format!("'{}' is not one of [{}]", value, allowed.join(", "))
            }
            ViolationKind::InvalidArrayElement { index, cause } => {
                format!("element {}: {}", index, cause)
            }
            ViolationKind::UndeclaredField => "field is not declared in the schema".to_string(),
            ViolationKind::ImmutableField { stored, attempted } => {
                format!("fixed at creation as {}, attempted {}", stored, attempted)
            }
        }
    }

    /// JSON form used in CLI responses
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "path": self.path,
            "kind": self.kind.label(),
            "code": self.kind.code(),
            "detail": self.detail(),
        });
        if let ViolationKind::InvalidArrayElement { index, cause } = &self.kind {
            out["index"] = json!(index);
            out["cause"] = cause.to_json();
        }
        out
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' [{}]: {}", self.path, self.kind.label(), self.detail())
    }
}

/// Complete, ordered list of violations for one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Violation>) {
        self.violations.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.violations
    }

    /// Violations whose root cause sits at `path`
    pub fn at_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.path == path || v.root_cause().path == path)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.violations.iter().map(Violation::to_json).collect())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "; {}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

/// Schema registry error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema ID not found
    UnknownSchema,
    /// Schema version not found
    UnknownSchemaVersion,
    /// Attempt to replace an existing schema version
    SchemaImmutable,
    /// Schema file or definition is malformed
    MalformedSchema,
}

impl SchemaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownSchema => "CONTRACT_UNKNOWN_SCHEMA",
            SchemaErrorCode::UnknownSchemaVersion => "CONTRACT_UNKNOWN_SCHEMA_VERSION",
            SchemaErrorCode::SchemaImmutable => "CONTRACT_SCHEMA_IMMUTABLE",
            SchemaErrorCode::MalformedSchema => "CONTRACT_MALFORMED_SCHEMA",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::MalformedSchema => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema registry error with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    schema_id: Option<String>,
    schema_version: Option<String>,
}

impl SchemaError {
    /// Create an unknown schema error
    pub fn unknown_schema(schema_id: impl Into<String>) -> Self {
        let id = schema_id.into();
        Self {
            code: SchemaErrorCode::UnknownSchema,
            message: format!("Schema '{}' not found", id),
            schema_id: Some(id),
            schema_version: None,
        }
    }

    /// Create an unknown schema version error
    pub fn unknown_version(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        Self {
            code: SchemaErrorCode::UnknownSchemaVersion,
            message: format!("Schema '{}' version '{}' not found", id, ver),
            schema_id: Some(id),
            schema_version: Some(ver),
        }
    }

    /// Create a schema immutable error
    pub fn schema_immutable(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        Self {
            code: SchemaErrorCode::SchemaImmutable,
            message: format!("Schema '{}' version '{}' is immutable", id, ver),
            schema_id: Some(id),
            schema_version: Some(ver),
        }
    }

    /// Create an error for a malformed schema file or definition
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MalformedSchema,
            message: format!("Malformed schema '{}': {}", path.into(), reason.into()),
            schema_id: None,
            schema_version: None,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema registry operations
pub type SchemaResult<T> = Result<T, SchemaError>;
