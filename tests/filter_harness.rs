#![allow(unused)]
//! Filter evaluator integration harness.
//!
//! # What this covers
//!
//! - **Term semantics**: text terms search every field, `key:value` is
//!   case-insensitive equality, `key:*value*` case-insensitive containment.
//! - **Value stringification**: numbers, booleans, arrays and nested objects
//!   compare by their compact JSON form; null never matches a text term.
//! - **Negation**: `-term` inverts the term, so a negated keyed term also
//!   matches records that lack the key.
//! - **Property: partition**: for any term, the records matching it and the
//!   records matching its negation partition the input.
//! - **Property: order**: filtering preserves input order and never invents
//!   records.
//!
//! # Running
//!
//! ```sh
//! cargo test --test filter_harness
//! ```

mod common;
use common::*;

use mrelic_core::search::{filter, filter_by_query, matches, SearchTerm};
use mrelic_core::LogRecord;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn records() -> Vec<LogRecord> {
    vec![
        RecordBuilder::new("GET /users 200")
            .id("r1")
            .at(1_000)
            .service("api-gateway")
            .attr("status", 200)
            .attr("user", json!({"id": "u1"}))
            .build(),
        RecordBuilder::new("Connection refused")
            .id("r2")
            .at(2_000)
            .level("error")
            .service("payments")
            .attr("host", "db.internal")
            .attr("port", 5432)
            .build(),
        RecordBuilder::new("Slow query")
            .id("r3")
            .at(3_000)
            .level("warn")
            .service("orders")
            .attr("duration_ms", 4200)
            .attr("tags", json!(["db", "slow"]))
            .build(),
        RecordBuilder::new("heartbeat")
            .id("r4")
            .at(4_000)
            .level("debug")
            .service("worker")
            .attr("note", json!(null))
            .attr("healthy", true)
            .build(),
    ]
}

fn ids(records: &[LogRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Term semantics
// ---------------------------------------------------------------------------

#[rstest]
#[case("refused", vec!["r2"])]
#[case("REFUSED", vec!["r2"])]
#[case("level:error", vec!["r2"])]
#[case("level:ERR", vec![])]
#[case("service:*GATE*", vec!["r1"])]
#[case("-level:debug", vec!["r1", "r2", "r3"])]
#[case("port:5432", vec!["r2"])]
#[case("host:*internal*", vec!["r2"])]
#[case("-host:db.internal", vec!["r1", "r3", "r4"])]
#[case("status:200 level:info", vec!["r1"])]
#[case("db", vec!["r2", "r3"])]
#[case("user:*u1*", vec!["r1"])]
#[case("healthy:true", vec!["r4"])]
#[case("null", vec![])]
#[case("\"slow query\"", vec!["r3"])]
#[case("service:*gate", vec![])]
#[case("id:r2", vec!["r2"])]
#[case("missing:anything", vec![])]
#[case("", vec!["r1", "r2", "r3", "r4"])]
fn query_semantics(records: Vec<LogRecord>, #[case] query: &str, #[case] expected: Vec<&str>) {
    let kept = filter_by_query(records, query);
    assert_eq!(ids(&kept), expected);
}

#[rstest]
fn nested_objects_compare_as_compact_json(records: Vec<LogRecord>) {
    let term = SearchTerm::key_value("user", r#"{"id":"u1"}"#);
    assert!(matches(&records[0], &[term]));
}

#[rstest]
fn no_terms_match_everything(records: Vec<LogRecord>) {
    assert_all!(records, |r: &LogRecord| matches(r, &[]));
}

#[test]
fn canonical_fields_shadow_attributes() {
    let record = RecordBuilder::new("m")
        .id("canonical")
        .attr("id", "from-payload")
        .build();
    assert!(matches(&record, &[SearchTerm::key_value("id", "canonical")]));
    assert!(!matches(&record, &[SearchTerm::key_value("id", "from-payload")]));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn term_strategy() -> impl Strategy<Value = SearchTerm> {
    let key = prop::sample::select(vec!["level", "service", "message", "host", "port", "seq"]);
    let value = "[a-z0-9]{0,6}";
    prop_oneof![
        value.prop_map(SearchTerm::text),
        (key.clone(), value).prop_map(|(k, v)| SearchTerm::key_value(k, v)),
        (key, value).prop_map(|(k, v)| SearchTerm::wildcard(k, v)),
    ]
}

proptest! {
    #[test]
    fn term_and_negation_partition_records(term in term_strategy()) {
        let corpus = sequential_records(24);
        let hits = filter(corpus.clone(), std::slice::from_ref(&term));
        let misses = filter(corpus.clone(), &[term.negated()]);

        prop_assert_eq!(hits.len() + misses.len(), corpus.len());
        for r in &hits {
            prop_assert!(!misses.iter().any(|m| m.id == r.id));
        }
    }

    #[test]
    fn filter_preserves_order_and_subset(terms in prop::collection::vec(term_strategy(), 0..3)) {
        let corpus = sequential_records(24);
        let kept = filter(corpus.clone(), &terms);

        let positions: Vec<usize> = kept
            .iter()
            .map(|r| corpus.iter().position(|c| c.id == r.id).expect("record must come from input"))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
