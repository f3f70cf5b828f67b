//! Contract default computation tests
//!
//! - Creation defaults fill absent fields only, on insert only
//! - Every-write timestamps strictly advance
//! - Slug and url derive from the title
//! - Closing date is the same wall-clock time on the next calendar day
//! - Signature ids capture the acting identity at element insertion

use contracts::contract::{contract_schema, Contract, ContractPipeline, Kind, Stage};
use chrono::{DateTime, FixedOffset};
use chrono_tz::America::New_York;
use contracts::schema::{
    parse_timestamp, validate, Clock, DefaultComputer, DerivationNotice, FixedClock, Operation,
    ZonedClock,
};
use serde_json::{json, Value};

/// New York calendar with a frozen current instant.
struct NewYorkAt(FixedClock);

impl Clock for NewYorkAt {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0.now()
    }

    fn add_calendar_days(&self, from: DateTime<FixedOffset>, days: u32) -> DateTime<FixedOffset> {
        ZonedClock::new(New_York).add_calendar_days(from, days)
    }
}

fn computer() -> DefaultComputer<FixedClock> {
    DefaultComputer::new(FixedClock::parse("2024-03-01T10:00:00Z").unwrap())
}

fn insert(candidate: Value) -> Value {
    computer()
        .compute(&contract_schema(), candidate, Operation::Insert, "u1")
        .into_document()
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn test_title_only_insert_gets_every_default() {
    let doc = insert(json!({"title": "New Policy"}));

    assert_eq!(doc["kind"], "VOTE");
    assert_eq!(doc["context"], "GLOBAL");
    assert_eq!(doc["stage"], "DRAFT");
    assert_eq!(doc["executionStatus"], "OPEN");
    assert_eq!(doc["allowForks"], true);
    assert_eq!(doc["executiveDecision"], true);
    assert_eq!(doc["isRoot"], true);
    for flag in [
        "membersOnly",
        "anonymous",
        "authorized",
        "isDefined",
        "alwaysOpen",
        "secretVotes",
        "realtimeResults",
        "multipleChoice",
        "rankPreferences",
    ] {
        assert_eq!(doc[flag], false, "{}", flag);
    }
    assert_eq!(doc["createdAt"], "2024-03-01T10:00:00Z");
    assert_eq!(doc["lastUpdate"], doc["timestamp"]);

    let valid = validate(doc, &contract_schema()).unwrap();
    let contract = Contract::from_document(&valid).unwrap();
    assert_eq!(contract.kind, Kind::Vote);
    assert_eq!(contract.stage, Stage::Draft);
    assert!(contract.signatures.is_empty());
}

#[test]
fn test_no_optional_fields_invented() {
    let doc = insert(json!({"title": "New Policy"}));
    for field in ["description", "tags", "signatures", "ballot", "referrers", "_id"] {
        assert!(doc.get(field).is_none(), "{}", field);
    }
}

// =============================================================================
// Slug and url
// =============================================================================

#[test]
fn test_slug_and_url_from_title() {
    let doc = insert(json!({"title": "Universal Basic Income"}));
    assert_eq!(doc["keyword"], "universal-basic-income");
    assert_eq!(doc["url"], "/vote/universal-basic-income");
}

#[test]
fn test_unsanitizable_title_uses_fallback() {
    let enriched = computer().compute(
        &contract_schema(),
        json!({"title": "¿¿??"}),
        Operation::Insert,
        "u1",
    );
    assert_eq!(enriched.document["keyword"], "untitled");
    assert_eq!(enriched.document["url"], "/vote/untitled");
    assert_eq!(enriched.notices.len(), 2);
    assert!(enriched
        .notices
        .iter()
        .all(|n| matches!(n, DerivationNotice::MalformedSlugSource { source, .. } if source == "title")));
    assert!(validate(enriched.document, &contract_schema()).is_ok());
}

#[test]
fn test_missing_title_still_total_but_invalid() {
    let doc = insert(json!({}));
    assert_eq!(doc["keyword"], "untitled");

    let errors = validate(doc, &contract_schema()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.violations()[0].path, "title");
}

#[test]
fn test_slug_not_recomputed_on_update() {
    let doc = insert(json!({"title": "Universal Basic Income"}));
    let mut changed = doc.clone();
    changed["title"] = json!("Something Else");

    let updated = computer()
        .compute(&contract_schema(), changed, Operation::Update, "u1")
        .into_document();
    assert_eq!(updated["keyword"], "universal-basic-income");
    assert_eq!(updated["url"], "/vote/universal-basic-income");
}

// =============================================================================
// Idempotence and monotonicity
// =============================================================================

#[test]
fn test_reinsert_keeps_creation_fields() {
    let first = insert(json!({"title": "New Policy"}));
    let later = DefaultComputer::new(FixedClock::parse("2024-06-01T08:00:00Z").unwrap());
    let second = later
        .compute(&contract_schema(), first.clone(), Operation::Insert, "u2")
        .into_document();

    for field in ["keyword", "url", "createdAt", "closingDate", "kind", "stage"] {
        assert_eq!(second[field], first[field], "{}", field);
    }
}

#[test]
fn test_successive_updates_strictly_advance() {
    let c = computer();
    let schema = contract_schema();
    let doc = insert(json!({"title": "New Policy"}));

    let first = c
        .compute_after(&schema, Some(&doc), doc.clone(), Operation::Update, "u1")
        .into_document();
    let second = c
        .compute_after(&schema, Some(&first), first.clone(), Operation::Update, "u1")
        .into_document();

    for field in ["lastUpdate", "timestamp"] {
        let a = parse_timestamp(first[field].as_str().unwrap()).unwrap();
        let b = parse_timestamp(second[field].as_str().unwrap()).unwrap();
        assert!(b > a, "{} did not advance", field);
    }
    assert_eq!(second["lastUpdate"], second["timestamp"]);
}

#[test]
fn test_future_stamp_on_insert_is_ignored() {
    let doc = insert(json!({"title": "New Policy", "lastUpdate": "2099-01-01T00:00:00Z"}));
    assert_eq!(doc["lastUpdate"], "2024-03-01T10:00:00Z");
    assert_eq!(doc["timestamp"], doc["createdAt"]);
}

#[test]
fn test_supplied_write_stamps_are_replaced() {
    let doc = insert(json!({
        "title": "New Policy",
        "lastUpdate": "1999-01-01T00:00:00Z",
        "timestamp": "1999-01-01T00:00:00Z"
    }));
    assert_eq!(doc["lastUpdate"], "2024-03-01T10:00:00Z");
    assert_eq!(doc["timestamp"], "2024-03-01T10:00:00Z");
}

// =============================================================================
// Closing date
// =============================================================================

#[test]
fn test_closing_date_is_next_calendar_day() {
    let doc = insert(json!({"title": "New Policy"}));
    assert_eq!(
        parse_timestamp(doc["closingDate"].as_str().unwrap()),
        parse_timestamp("2024-03-02T10:00:00Z")
    );
}

#[test]
fn test_closing_date_keeps_clock_offset() {
    let c = DefaultComputer::new(FixedClock::parse("2024-03-31T01:30:00+01:00").unwrap());
    let doc = c
        .compute(&contract_schema(), json!({"title": "T"}), Operation::Insert, "u1")
        .into_document();
    assert_eq!(doc["closingDate"], "2024-04-01T01:30:00+01:00");
}

#[test]
fn test_closing_date_across_dst_switch_keeps_wall_time() {
    let c = DefaultComputer::new(NewYorkAt(
        FixedClock::parse("2024-03-09T10:00:00-05:00").unwrap(),
    ));
    let doc = c
        .compute(&contract_schema(), json!({"title": "T"}), Operation::Insert, "u1")
        .into_document();
    assert_eq!(doc["closingDate"], "2024-03-10T10:00:00-04:00");

    let created = parse_timestamp(doc["createdAt"].as_str().unwrap()).unwrap();
    let closing = parse_timestamp(doc["closingDate"].as_str().unwrap()).unwrap();
    assert_eq!(closing - created, chrono::Duration::hours(23));
}

// =============================================================================
// Signature identity
// =============================================================================

#[test]
fn test_signature_ids_captured_at_element_insert() {
    let c = computer();
    let schema = contract_schema();
    let doc = c
        .compute(
            &schema,
            json!({"title": "T", "signatures": [{"role": "AUTHOR"}]}),
            Operation::Insert,
            "alice",
        )
        .into_document();
    assert_eq!(doc["signatures"][0]["_id"], "alice");

    let mut changed = doc.clone();
    changed["signatures"]
        .as_array_mut()
        .unwrap()
        .push(json!({"role": "ENDORSER"}));
    let updated = c
        .compute(&schema, changed, Operation::Update, "bob")
        .into_document();

    assert_eq!(updated["signatures"][0]["_id"], "alice");
    assert_eq!(updated["signatures"][1]["_id"], "bob");
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
    let pipeline = std::sync::Arc::new(ContractPipeline::with_clock(
        FixedClock::parse("2024-03-01T10:00:00Z").unwrap(),
    ));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let p = pipeline.clone();
            std::thread::spawn(move || {
                p.insert(json!({"title": format!("Policy {}", i)}), "u1")
                    .map(|a| a.document.into_value()["keyword"].clone())
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap().unwrap(), json!(format!("policy-{}", i)));
    }
}
