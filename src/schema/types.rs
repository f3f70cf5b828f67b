//! Field specification types
//!
//! A schema is a closed table of field definitions. Every definition carries
//! a type, an optionality flag and, for auto-derived fields, a derivation
//! rule consumed by the default computer.
//!
//! Supported types:
//! - string: UTF-8 string
//! - number: any JSON number
//! - bool: Boolean
//! - timestamp: RFC 3339 date-time string
//! - enum: string restricted to a declared value set
//! - object: nested object with field schema
//! - opaque: object whose contents are not constrained
//! - array: homogeneous array with element type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// JSON number (integer or float)
    Number,
    /// Boolean
    Bool,
    /// RFC 3339 date-time string
    Timestamp,
    /// String restricted to an allowed value set
    Enum {
        /// Allowed values, in declaration order
        values: Vec<String>,
    },
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: BTreeMap<String, FieldDef>,
    },
    /// Object with unconstrained contents
    Opaque,
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        #[serde(rename = "element_type")]
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Timestamp => "timestamp",
            FieldType::Enum { .. } => "enum",
            FieldType::Object { .. } => "object",
            FieldType::Opaque => "object",
            FieldType::Array { .. } => "array",
        }
    }

    /// Enumeration over the given values
    pub fn enumeration<S: AsRef<str>>(values: &[S]) -> Self {
        FieldType::Enum {
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    /// Array of the given element type
    pub fn array_of(element_type: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element_type),
        }
    }

    /// Object with the given fields
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDef)>,
        K: Into<String>,
    {
        FieldType::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Fields of an array-of-object element, if this is one
    pub fn element_fields(&self) -> Option<&BTreeMap<String, FieldDef>> {
        match self {
            FieldType::Array { element_type } => match element_type.as_ref() {
                FieldType::Object { fields } => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }
}

/// When a derivation rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeriveWhen {
    /// Only when the document is created, and only if the field is absent
    Insert,
    /// On every write, replacing any supplied value
    EveryWrite,
    /// When an array element lacking the field is written, on any operation
    ElementInsert,
}

/// How a derived value is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DefaultRule {
    /// Fixed value
    Literal { value: Value },
    /// Slug of another string field
    Slug { source: String },
    /// Route prefix followed by the slug of another string field
    Route { prefix: String, source: String },
    /// Current time
    Now,
    /// Same wall-clock time a number of calendar days from now
    CalendarDaysAfterNow { days: u32 },
    /// Identity of the actor performing the write
    ActingIdentity,
}

impl DefaultRule {
    /// Field this rule reads from, if any
    pub fn source(&self) -> Option<&str> {
        match self {
            DefaultRule::Slug { source } | DefaultRule::Route { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A derivation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivation {
    pub when: DeriveWhen,
    #[serde(flatten)]
    pub rule: DefaultRule,
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present after defaults are computed
    pub required: bool,
    /// Derivation rule for auto-derived fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derive: Option<Derivation>,
    /// Fixed once stored; updates may repeat the value but not change it
    #[serde(default, skip_serializing_if = "is_false")]
    pub immutable: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldDef {
    /// Create a required field of the given type
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            derive: None,
            immutable: false,
        }
    }

    /// Create an optional field of the given type
    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            derive: None,
            immutable: false,
        }
    }

    /// Create a required string field
    pub fn required_string() -> Self {
        Self::required(FieldType::String)
    }

    /// Create an optional string field
    pub fn optional_string() -> Self {
        Self::optional(FieldType::String)
    }

    /// Create a required number field
    pub fn required_number() -> Self {
        Self::required(FieldType::Number)
    }

    /// Create a required bool field
    pub fn required_bool() -> Self {
        Self::required(FieldType::Bool)
    }

    /// Create a required timestamp field
    pub fn required_timestamp() -> Self {
        Self::required(FieldType::Timestamp)
    }

    /// Create an optional array field
    pub fn optional_array(element_type: FieldType) -> Self {
        Self::optional(FieldType::array_of(element_type))
    }

    /// Attach a creation-only derivation
    pub fn on_insert(self, rule: DefaultRule) -> Self {
        self.derived(DeriveWhen::Insert, rule)
    }

    /// Attach an every-write derivation
    pub fn on_every_write(self, rule: DefaultRule) -> Self {
        self.derived(DeriveWhen::EveryWrite, rule)
    }

    /// Attach an element-insert derivation
    pub fn on_element_insert(self, rule: DefaultRule) -> Self {
        self.derived(DeriveWhen::ElementInsert, rule)
    }

    /// Mark the field as fixed at creation
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    fn derived(mut self, when: DeriveWhen, rule: DefaultRule) -> Self {
        self.derive = Some(Derivation { when, rule });
        self
    }
}

/// Complete, versioned schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema identifier
    pub schema_id: String,
    /// Schema version
    pub schema_version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions, keyed by top-level field name
    pub fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Create a new schema
    pub fn new(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        fields: BTreeMap<String, FieldDef>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
            description: None,
            fields,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the unique key for this schema (id, version)
    pub fn key(&self) -> (&str, &str) {
        (&self.schema_id, &self.schema_version)
    }

    /// Looks up a field by dotted path.
    ///
    /// Array elements are addressed with `$`, e.g. `signatures.$.role`.
    pub fn field(&self, path: &str) -> Option<&FieldDef> {
        let mut segments = path.split('.');
        let mut def = self.fields.get(segments.next()?)?;
        while let Some(segment) = segments.next() {
            def = match (&def.field_type, segment) {
                (FieldType::Array { .. }, "$") => {
                    let element_fields = def.field_type.element_fields()?;
                    element_fields.get(segments.next()?)?
                }
                (FieldType::Object { fields }, name) => fields.get(name)?,
                _ => return None,
            };
        }
        Some(def)
    }

    /// Top-level fields fixed at creation, in schema order
    pub fn immutable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.immutable)
            .map(|(name, _)| name.as_str())
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.schema_id.is_empty() || self.schema_version.is_empty() {
            return Err("Schema id and version must be non-empty".into());
        }
        check_fields(&self.fields, "", true)
    }
}

fn check_fields(
    fields: &BTreeMap<String, FieldDef>,
    prefix: &str,
    top_level: bool,
) -> Result<(), String> {
    for (name, def) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        check_type(&def.field_type, &path)?;
        if def.immutable && !top_level {
            return Err(format!("'{}': only top-level fields can be immutable", path));
        }

        let Some(derive) = &def.derive else { continue };
        match (derive.when, top_level) {
            (DeriveWhen::ElementInsert, true) => {
                return Err(format!(
                    "'{}': element_insert derivation is only valid inside array elements",
                    path
                ));
            }
            (DeriveWhen::Insert | DeriveWhen::EveryWrite, false) => {
                return Err(format!(
                    "'{}': nested fields only support element_insert derivation",
                    path
                ));
            }
            _ => {}
        }
        if let Some(source) = derive.rule.source() {
            match fields.get(source) {
                Some(src) if src.field_type == FieldType::String => {}
                Some(_) => {
                    return Err(format!("'{}': derivation source '{}' is not a string", path, source));
                }
                None => {
                    return Err(format!("'{}': derivation source '{}' is not declared", path, source));
                }
            }
        }
    }
    Ok(())
}

fn check_type(field_type: &FieldType, path: &str) -> Result<(), String> {
    match field_type {
        FieldType::Enum { values } if values.is_empty() => {
            Err(format!("'{}': enum must declare at least one value", path))
        }
        FieldType::Object { fields } => check_fields(fields, path, false),
        FieldType::Array { element_type } => check_type(element_type, &format!("{}.$", path)),
        _ => Ok(()),
    }
}
