//! Contract document model
//!
//! The field specification table for contracts, plus typed views of a
//! validated document. The enumerations below are the single source of the
//! allowed value sets used by the table.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::schema::{DefaultRule, FieldDef, FieldType, Schema, ValidDocument};

pub const CONTRACT_SCHEMA_ID: &str = "contracts";
pub const CONTRACT_SCHEMA_VERSION: &str = "1";

/// Route prefix prepended to the slug to form a contract's url.
pub const ROUTE_PREFIX: &str = "/vote";

macro_rules! value_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Enumerated field type over every value.
            pub fn field_type() -> FieldType {
                FieldType::Enum {
                    values: Self::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

value_enum!(
    /// What the contract decides
    Kind {
        Vote => "VOTE",
        Delegation => "DELEGATION",
        Membership => "MEMBERSHIP",
    }
);

value_enum!(
    /// Where the contract lives
    Context {
        Global => "GLOBAL",
        Local => "LOCAL",
    }
);

value_enum!(
    /// Outcome of the decision process
    ExecutionStatus {
        Open => "OPEN",
        Approved => "APPROVED",
        Alternative => "ALTERNATIVE",
        Rejected => "REJECTED",
    }
);

value_enum!(
    /// Lifecycle phase
    Stage {
        Draft => "DRAFT",
        Live => "LIVE",
        Finish => "FINISH",
    }
);

value_enum!(
    /// Part a signer played
    SignatureRole {
        Author => "AUTHOR",
        Delegator => "DELEGATOR",
        Delegate => "DELEGATE",
        Endorser => "ENDORSER",
    }
);

impl Stage {
    /// Stages only move forward: DRAFT -> LIVE -> FINISH.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Draft, Stage::Live) | (Stage::Live, Stage::Finish)
        )
    }
}

impl ExecutionStatus {
    pub fn is_decided(self) -> bool {
        self != ExecutionStatus::Open
    }
}

fn literal(value: Value) -> DefaultRule {
    DefaultRule::Literal { value }
}

fn flag(default: bool) -> FieldDef {
    FieldDef::required_bool().on_insert(literal(json!(default)))
}

fn choice(field_type: FieldType, default: &str) -> FieldDef {
    FieldDef::required(field_type).on_insert(literal(json!(default)))
}

/// The contract field specification.
pub fn contract_schema() -> Schema {
    let mut fields = BTreeMap::new();
    let mut add = |name: &str, def: FieldDef| {
        fields.insert(name.to_string(), def);
    };

    add("_id", FieldDef::optional_string());
    add("title", FieldDef::required_string().immutable());
    add(
        "keyword",
        FieldDef::required_string()
            .on_insert(DefaultRule::Slug {
                source: "title".into(),
            })
            .immutable(),
    );
    add("kind", choice(Kind::field_type(), Kind::Vote.as_str()));
    add("context", choice(Context::field_type(), Context::Global.as_str()));
    add(
        "url",
        FieldDef::required_string()
            .on_insert(DefaultRule::Route {
                prefix: ROUTE_PREFIX.into(),
                source: "title".into(),
            })
            .immutable(),
    );
    add("description", FieldDef::optional_string());
    add(
        "createdAt",
        FieldDef::required_timestamp()
            .on_insert(DefaultRule::Now)
            .immutable(),
    );
    add("lastUpdate", FieldDef::required_timestamp().on_every_write(DefaultRule::Now));
    add("timestamp", FieldDef::required_timestamp().on_every_write(DefaultRule::Now));
    add(
        "tags",
        FieldDef::optional_array(FieldType::object([
            ("_id", FieldDef::required_string()),
            ("label", FieldDef::required_string()),
            ("url", FieldDef::required_string()),
            ("rank", FieldDef::required_number()),
        ])),
    );
    add("membersOnly", flag(false));
    add(
        "executionStatus",
        choice(ExecutionStatus::field_type(), ExecutionStatus::Open.as_str()),
    );
    add("anonymous", flag(false));
    add(
        "signatures",
        FieldDef::optional_array(FieldType::object([
            (
                "_id",
                FieldDef::required_string().on_element_insert(DefaultRule::ActingIdentity),
            ),
            ("role", FieldDef::optional(SignatureRole::field_type())),
            ("hash", FieldDef::optional_string()),
            ("picture", FieldDef::optional_string()),
            ("firstName", FieldDef::optional_string()),
            ("lastName", FieldDef::optional_string()),
            ("country", FieldDef::optional_string()),
        ])),
    );
    add(
        "closingDate",
        FieldDef::required_timestamp().on_insert(DefaultRule::CalendarDaysAfterNow { days: 1 }),
    );
    add("alwaysOpen", flag(false));
    add("allowForks", flag(true));
    add("secretVotes", flag(false));
    add("realtimeResults", flag(false));
    add("multipleChoice", flag(false));
    add("rankPreferences", flag(false));
    add("executiveDecision", flag(true));
    add("stage", choice(Stage::field_type(), Stage::Draft.as_str()));
    add(
        "ballot",
        FieldDef::optional_array(FieldType::object([
            ("_id", FieldDef::required_string()),
            ("mode", FieldDef::required_string()),
            ("rank", FieldDef::required_number()),
            ("url", FieldDef::optional_string()),
            ("label", FieldDef::optional_string()),
        ])),
    );
    add("authorized", flag(false));
    add("isDefined", flag(false));
    add("isRoot", flag(true));
    add("referrers", FieldDef::optional_array(FieldType::Opaque));

    Schema::new(CONTRACT_SCHEMA_ID, CONTRACT_SCHEMA_VERSION, fields)
        .with_description("Vote, delegation or membership decision")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
    pub url: String,
    pub rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SignatureRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One decision option on the ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotOption {
    #[serde(rename = "_id")]
    pub id: String,
    pub mode: String,
    pub rank: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Back-reference from another contract; shape is owned by whoever appends it.
pub type Referrer = Map<String, Value>;

/// Typed view of a validated contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub keyword: String,
    pub kind: Kind,
    pub context: Context,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub last_update: DateTime<FixedOffset>,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub members_only: bool,
    pub execution_status: ExecutionStatus,
    pub anonymous: bool,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    pub closing_date: DateTime<FixedOffset>,
    pub always_open: bool,
    pub allow_forks: bool,
    pub secret_votes: bool,
    pub realtime_results: bool,
    pub multiple_choice: bool,
    pub rank_preferences: bool,
    pub executive_decision: bool,
    pub stage: Stage,
    #[serde(default)]
    pub ballot: Vec<BallotOption>,
    pub authorized: bool,
    pub is_defined: bool,
    pub is_root: bool,
    #[serde(default)]
    pub referrers: Vec<Referrer>,
}

impl Contract {
    /// Typed view of a document validated against the contract schema.
    pub fn from_document(doc: &ValidDocument) -> Result<Self, serde_json::Error> {
        Contract::deserialize(doc.as_value())
    }

    /// (stage, executionStatus) pair
    pub fn lifecycle(&self) -> (Stage, ExecutionStatus) {
        (self.stage, self.execution_status)
    }

    /// Finished with a decided outcome; no further transitions.
    pub fn is_terminal(&self) -> bool {
        self.stage == Stage::Finish && self.execution_status.is_decided()
    }

    pub fn signed_by(&self, identity: &str) -> bool {
        self.signatures.iter().any(|s| s.id == identity)
    }
}
