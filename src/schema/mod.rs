//! Schema engine
//!
//! A schema is a closed, versioned table of field definitions. Writes flow
//! through two pure steps:
//!
//! 1. `DefaultComputer` fills derived fields (creation-only or every-write)
//! 2. `SchemaValidator` checks the result and reports every violation
//!
//! # Design Principles
//!
//! - Defaults only for fields carrying a derivation rule
//! - No nulls, no coercion, no undeclared fields
//! - Violations are accumulated, never fail-fast
//! - Deterministic validation
//! - No I/O and no logging outside the loader

mod clock;
mod defaults;
mod errors;
mod loader;
mod slug;
mod types;
mod validator;

pub use clock::{format_timestamp, parse_timestamp, Clock, FixedClock, SystemClock, ZonedClock};
pub use defaults::{
    compute_defaults, DefaultComputer, DerivationNotice, Enriched, Operation, DEFAULT_FALLBACK_SLUG,
};
pub use errors::{
    SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationErrors, Violation,
    ViolationKind,
};
pub use loader::SchemaLoader;
pub use slug::{is_slug, slugify};
pub use types::{DefaultRule, Derivation, DeriveWhen, FieldDef, FieldType, Schema};
pub use validator::{validate, SchemaValidator, ValidDocument};
