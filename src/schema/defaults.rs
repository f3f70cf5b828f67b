//! Default computer
//!
//! Fills derived fields before validation:
//! - `insert` rules fire on document creation, only for absent fields
//! - `every_write` rules fire on every operation and replace supplied values
//! - `element_insert` rules fire for array elements lacking the field,
//!   whatever the operation, and never touch elements that already have it
//!
//! A `null` counts as absent. Every-write stamps advance past the stamps of
//! the stored document, never past values in the candidate.
//!
//! Computation is total. A title that yields no slug degrades to the
//! configured fallback and is reported as a notice, not an error.

use chrono::{DateTime, Datelike, Duration, FixedOffset};
use serde_json::{Map, Value};

use super::clock::{format_timestamp, parse_timestamp, Clock, SystemClock};
use super::slug::slugify;
use super::types::{DefaultRule, DeriveWhen, Schema};

/// Slug used when the source text yields no slug.
pub const DEFAULT_FALLBACK_SLUG: &str = "untitled";

/// Kind of write being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
        }
    }
}

/// Non-fatal observation made while deriving values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationNotice {
    /// Slug source was empty or unsanitizable; fallback slug used
    MalformedSlugSource { field: String, source: String },
}

/// Output of default computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched {
    pub document: Value,
    pub notices: Vec<DerivationNotice>,
}

impl Enriched {
    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Computes derived fields for a schema.
#[derive(Debug, Clone)]
pub struct DefaultComputer<C: Clock = SystemClock> {
    clock: C,
    fallback_slug: String,
}

impl Default for DefaultComputer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock::default())
    }
}

impl<C: Clock> DefaultComputer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            fallback_slug: DEFAULT_FALLBACK_SLUG.to_string(),
        }
    }

    pub fn with_fallback_slug(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_slug = fallback.into();
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fills derived fields of `candidate` for the given operation.
    ///
    /// Non-object candidates are returned unchanged; the validator rejects them.
    pub fn compute(
        &self,
        schema: &Schema,
        candidate: Value,
        operation: Operation,
        acting_identity: &str,
    ) -> Enriched {
        self.compute_after(schema, None, candidate, operation, acting_identity)
    }

    /// Like [`compute`](Self::compute), with `stored` as the last written
    /// version of the document.
    pub fn compute_after(
        &self,
        schema: &Schema,
        stored: Option<&Value>,
        candidate: Value,
        operation: Operation,
        acting_identity: &str,
    ) -> Enriched {
        let mut doc = match candidate {
            Value::Object(doc) => doc,
            other => {
                return Enriched {
                    document: other,
                    notices: Vec::new(),
                }
            }
        };

        let now = self.clock.now();
        let write_stamp = write_stamp(schema, stored.and_then(Value::as_object), now);
        let mut notices = Vec::new();

        for (name, def) in &schema.fields {
            if let Some(derive) = &def.derive {
                let fire = match derive.when {
                    DeriveWhen::Insert => operation == Operation::Insert && is_absent(&doc, name),
                    DeriveWhen::EveryWrite => true,
                    DeriveWhen::ElementInsert => false,
                };
                if fire {
                    let value = match (&derive.rule, derive.when) {
                        (DefaultRule::Now, DeriveWhen::EveryWrite) => {
                            Value::String(format_timestamp(write_stamp))
                        }
                        (rule, _) => {
                            self.evaluate(rule, name, &doc, now, acting_identity, &mut notices)
                        }
                    };
                    doc.insert(name.clone(), value);
                }
            }

            let Some(element_fields) = def.field_type.element_fields() else {
                continue;
            };
            let Some(Value::Array(items)) = doc.get_mut(name) else {
                continue;
            };
            for item in items.iter_mut() {
                let Value::Object(element) = item else { continue };
                for (field, field_def) in element_fields {
                    let Some(derive) = &field_def.derive else { continue };
                    if derive.when != DeriveWhen::ElementInsert || !is_absent(element, field) {
                        continue;
                    }
                    let value =
                        self.evaluate(&derive.rule, field, element, now, acting_identity, &mut notices);
                    element.insert(field.clone(), value);
                }
            }
        }

        Enriched {
            document: Value::Object(doc),
            notices,
        }
    }

    fn evaluate(
        &self,
        rule: &DefaultRule,
        field: &str,
        scope: &Map<String, Value>,
        now: DateTime<FixedOffset>,
        acting_identity: &str,
        notices: &mut Vec<DerivationNotice>,
    ) -> Value {
        match rule {
            DefaultRule::Literal { value } => value.clone(),
            DefaultRule::Slug { source } => {
                Value::String(self.slug_from(field, source, scope, notices))
            }
            DefaultRule::Route { prefix, source } => {
                let slug = self.slug_from(field, source, scope, notices);
                Value::String(format!("{}/{}", prefix.trim_end_matches('/'), slug))
            }
            DefaultRule::Now => Value::String(format_timestamp(now)),
            DefaultRule::CalendarDaysAfterNow { days } => {
                Value::String(format_timestamp(self.clock.add_calendar_days(now, *days)))
            }
            DefaultRule::ActingIdentity => Value::String(acting_identity.to_string()),
        }
    }

    fn slug_from(
        &self,
        field: &str,
        source: &str,
        scope: &Map<String, Value>,
        notices: &mut Vec<DerivationNotice>,
    ) -> String {
        let text = scope.get(source).and_then(Value::as_str).unwrap_or("");
        let slug = slugify(text);
        if !slug.is_empty() {
            return slug;
        }
        notices.push(DerivationNotice::MalformedSlugSource {
            field: field.to_string(),
            source: source.to_string(),
        });
        self.fallback_slug.clone()
    }
}

fn is_absent(scope: &Map<String, Value>, field: &str) -> bool {
    scope.get(field).map_or(true, Value::is_null)
}

/// Timestamp for every-write fields: the current time, pushed past any
/// every-write stamp of the stored document so successive writes strictly
/// advance. Stamps that would leave the RFC 3339 year range fall back to now.
fn write_stamp(
    schema: &Schema,
    stored: Option<&Map<String, Value>>,
    now: DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    let Some(stored) = stored else { return now };
    let previous = schema
        .fields
        .iter()
        .filter(|(_, def)| {
            matches!(
                &def.derive,
                Some(d) if d.when == DeriveWhen::EveryWrite && d.rule == DefaultRule::Now
            )
        })
        .filter_map(|(name, _)| stored.get(name)?.as_str().and_then(parse_timestamp))
        .max();

    match previous {
        Some(prev) if now <= prev => prev
            .checked_add_signed(Duration::milliseconds(1))
            .filter(|t| t.year() <= 9999)
            .unwrap_or(now),
        _ => now,
    }
}

/// Fills derived fields of `candidate` using the system clock.
pub fn compute_defaults(
    schema: &Schema,
    candidate: Value,
    operation: Operation,
    acting_identity: &str,
) -> Value {
    DefaultComputer::default()
        .compute(schema, candidate, operation, acting_identity)
        .into_document()
}
