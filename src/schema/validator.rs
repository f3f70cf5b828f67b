//! Schema validator for contract documents
//!
//! Validation semantics:
//! - All required fields are present
//! - No undeclared fields exist
//! - Field types exactly match schema types
//! - Enumerated fields hold a declared value
//! - Every array element matches its element schema
//!
//! Unlike a fail-fast check, the validator walks the whole document and
//! reports every violation it finds, in schema field order.
//! Validator does not mutate documents.

use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::errors::{ValidationErrors, Violation};
use super::types::{FieldDef, FieldType, Schema};

/// A document that passed validation against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDocument {
    document: Value,
}

impl ValidDocument {
    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }

    /// Top-level field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.document.get(field)
    }
}

/// Schema validator that enforces a schema on documents.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Validates a document, accepting it or returning every violation found.
    pub fn validate(&self, document: Value) -> Result<ValidDocument, ValidationErrors> {
        let violations = self.violations(&document);
        if violations.is_empty() {
            Ok(ValidDocument { document })
        } else {
            Err(ValidationErrors::new(violations))
        }
    }

    /// Collects all violations without taking ownership of the document.
    pub fn violations(&self, document: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        match document.as_object() {
            Some(obj) => self.check_object(obj, &self.schema.fields, "", &mut out),
            None => out.push(Violation::wrong_type(
                "$root",
                "object",
                json_type_name(document),
            )),
        }
        out
    }

    /// Validates an object against field definitions.
    fn check_object(
        &self,
        obj: &Map<String, Value>,
        fields: &BTreeMap<String, FieldDef>,
        path_prefix: &str,
        out: &mut Vec<Violation>,
    ) {
        for (field_name, field_def) in fields {
            let field_path = make_path(path_prefix, field_name);
            match obj.get(field_name) {
                Some(value) => self.check_value(value, &field_def.field_type, &field_path, out),
                None if field_def.required => out.push(Violation::missing_required(field_path)),
                None => {}
            }
        }

        for key in obj.keys() {
            if !fields.contains_key(key) {
                out.push(Violation::undeclared_field(make_path(path_prefix, key)));
            }
        }
    }

    /// Validates a value against a field type.
    fn check_value(
        &self,
        value: &Value,
        expected_type: &FieldType,
        field_path: &str,
        out: &mut Vec<Violation>,
    ) {
        if value.is_null() {
            out.push(Violation::wrong_type(field_path, expected_type.type_name(), "null"));
            return;
        }

        match expected_type {
            FieldType::String => {
                if !value.is_string() {
                    out.push(type_error(field_path, "string", value));
                }
            }
            FieldType::Number => {
                if !value.is_number() {
                    out.push(type_error(field_path, "number", value));
                }
            }
            FieldType::Bool => {
                if !value.is_boolean() {
                    out.push(type_error(field_path, "bool", value));
                }
            }
            FieldType::Timestamp => match value.as_str() {
                Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => {}
                Some(_) => out.push(Violation::wrong_type(
                    field_path,
                    "timestamp",
                    "non-RFC 3339 string",
                )),
                None => out.push(type_error(field_path, "timestamp", value)),
            },
            FieldType::Enum { values } => match value.as_str() {
                Some(s) if values.iter().any(|v| v == s) => {}
                Some(s) => out.push(Violation::invalid_enum_value(field_path, s, values)),
                None => out.push(type_error(field_path, "enum", value)),
            },
            FieldType::Object { fields } => match value.as_object() {
                Some(obj) => self.check_object(obj, fields, field_path, out),
                None => out.push(type_error(field_path, "object", value)),
            },
            FieldType::Opaque => {
                if !value.is_object() {
                    out.push(type_error(field_path, "object", value));
                }
            }
            FieldType::Array { element_type } => {
                let Some(arr) = value.as_array() else {
                    out.push(type_error(field_path, "array", value));
                    return;
                };

                let elem_path = format!("{}.$", field_path);
                for (i, elem) in arr.iter().enumerate() {
                    let mut nested = Vec::new();
                    self.check_value(elem, element_type, &elem_path, &mut nested);
                    out.extend(
                        nested
                            .into_iter()
                            .map(|cause| Violation::invalid_array_element(field_path, i, cause)),
                    );
                }
            }
        }
    }
}

/// Validates `document` against `schema`.
pub fn validate(document: Value, schema: &Schema) -> Result<ValidDocument, ValidationErrors> {
    SchemaValidator::new(schema).validate(document)
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn type_error(field_path: &str, expected: &str, actual: &Value) -> Violation {
    Violation::wrong_type(field_path, expected, json_type_name(actual))
}
