//! Compute-then-validate pipeline for contract writes
//!
//! The storage collaborator calls `insert` or `update` before every write it
//! accepts. Both are pure: same inputs and clock reading, same result.

use serde_json::{Map, Value};

use crate::schema::{
    Clock, DefaultComputer, DerivationNotice, Operation, Schema, SchemaValidator, SystemClock,
    ValidDocument, ValidationErrors, Violation,
};

use super::model::contract_schema;

/// A write that passed the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub document: ValidDocument,
    pub notices: Vec<DerivationNotice>,
}

/// Ties the contract schema to a default computer.
pub struct ContractPipeline<C: Clock = SystemClock> {
    schema: Schema,
    defaults: DefaultComputer<C>,
}

impl ContractPipeline<SystemClock> {
    pub fn new() -> Self {
        Self::with_computer(contract_schema(), DefaultComputer::default())
    }
}

impl Default for ContractPipeline<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ContractPipeline<C> {
    /// Contract schema with the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self::with_computer(contract_schema(), DefaultComputer::new(clock))
    }

    pub fn with_computer(schema: Schema, defaults: DefaultComputer<C>) -> Self {
        Self { schema, defaults }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn defaults(&self) -> &DefaultComputer<C> {
        &self.defaults
    }

    /// Prepares a new contract.
    pub fn insert(&self, candidate: Value, acting_identity: &str) -> Result<Accepted, ValidationErrors> {
        self.run(None, candidate, Operation::Insert, acting_identity, Vec::new())
    }

    /// Prepares a change to a stored contract.
    ///
    /// `changes` replaces top-level fields of `stored`. Changing a field the
    /// schema marks immutable is reported alongside any schema violations.
    /// Write stamps advance past those of `stored`; stamps in `changes` are
    /// ignored.
    pub fn update(
        &self,
        stored: &Value,
        changes: Value,
        acting_identity: &str,
    ) -> Result<Accepted, ValidationErrors> {
        let (Some(stored_obj), Value::Object(changes)) = (stored.as_object(), changes) else {
            return Err(ValidationErrors::new(vec![Violation::wrong_type(
                "$root",
                "object",
                "non-object stored document or changes",
            )]));
        };

        let mut prior = Vec::new();
        for field in self.schema.immutable_fields() {
            if let (Some(old), Some(new)) = (stored_obj.get(field), changes.get(field)) {
                if old != new {
                    prior.push(Violation::immutable_field(field, old.clone(), new.clone()));
                }
            }
        }

        let mut merged: Map<String, Value> = stored_obj.clone();
        merged.extend(changes);
        self.run(
            Some(stored),
            Value::Object(merged),
            Operation::Update,
            acting_identity,
            prior,
        )
    }

    /// Runs the pipeline for an arbitrary operation.
    pub fn prepare(
        &self,
        candidate: Value,
        operation: Operation,
        acting_identity: &str,
    ) -> Result<Accepted, ValidationErrors> {
        self.run(None, candidate, operation, acting_identity, Vec::new())
    }

    fn run(
        &self,
        stored: Option<&Value>,
        candidate: Value,
        operation: Operation,
        acting_identity: &str,
        mut violations: Vec<Violation>,
    ) -> Result<Accepted, ValidationErrors> {
        let enriched = self
            .defaults
            .compute_after(&self.schema, stored, candidate, operation, acting_identity);
        match SchemaValidator::new(&self.schema).validate(enriched.document) {
            Ok(document) if violations.is_empty() => Ok(Accepted {
                document,
                notices: enriched.notices,
            }),
            Ok(_) => Err(ValidationErrors::new(violations)),
            Err(errors) => {
                violations.extend(errors);
                Err(ValidationErrors::new(violations))
            }
        }
    }
}
