//! contracts - schema validation and computed defaults for governance
//! contract documents
//!
//! A contract records a vote, delegation or membership decision. Before the
//! storage layer accepts a write, the document passes through two pure steps:
//! derived fields are computed, then the result is validated against the
//! contract field specification.

pub mod cli;
pub mod contract;
pub mod observability;
pub mod schema;
