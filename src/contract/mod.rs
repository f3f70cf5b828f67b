//! Governance contracts
//!
//! A contract records a vote, delegation or membership decision. This module
//! defines its field specification and the write pipeline the storage layer
//! runs before every insert and update.
//!
//! Lifecycle (driven externally, values enforced by the schema):
//!
//! ```text
//! stage:            DRAFT -> LIVE -> FINISH
//! executionStatus:  OPEN  -> APPROVED | ALTERNATIVE | REJECTED
//! ```

mod model;
mod pipeline;

pub use model::{
    contract_schema, BallotOption, Context, Contract, ExecutionStatus, Kind, Referrer, Signature,
    SignatureRole, Stage, Tag, CONTRACT_SCHEMA_ID, CONTRACT_SCHEMA_VERSION, ROUTE_PREFIX,
};
pub use pipeline::{Accepted, ContractPipeline};
