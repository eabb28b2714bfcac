//! Filter evaluator. Applies parsed [`SearchTerm`]s to [`LogRecord`]s.
//!
//! Terms combine with AND. Each term is evaluated, then inverted if negated,
//! so `-key:value` also matches records that have no `key` at all. All
//! comparisons are case-insensitive.

use std::borrow::Cow;

use serde_json::Value;

use super::parser::{parse, SearchTerm, TermKind};
use crate::types::{FieldValue, LogRecord};

/// `true` iff every term holds for `record`. No terms match everything.
pub fn matches(record: &LogRecord, terms: &[SearchTerm]) -> bool {
    terms.iter().all(|term| term_matches(record, term))
}

/// Evaluate one term, negation included.
pub fn term_matches(record: &LogRecord, term: &SearchTerm) -> bool {
    let needle = term.value.to_lowercase();
    let hit = match &term.kind {
        TermKind::KeyValue { key } => record
            .field(key)
            .is_some_and(|v| stringify(v).to_lowercase() == needle),
        TermKind::Wildcard { key } => record
            .field(key)
            .is_some_and(|v| stringify(v).to_lowercase().contains(&needle)),
        TermKind::Text => record.fields().any(|(_, v)| match v {
            FieldValue::Json(Value::Null) => false,
            other => stringify(other).to_lowercase().contains(&needle),
        }),
    };
    hit != term.negate
}

/// Keep the records that match, preserving order.
pub fn filter(records: Vec<LogRecord>, terms: &[SearchTerm]) -> Vec<LogRecord> {
    if terms.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| matches(r, terms)).collect()
}

/// Parse `query` once and filter `records` with the result.
pub fn filter_by_query(records: Vec<LogRecord>, query: &str) -> Vec<LogRecord> {
    let terms = parse(query);
    let before = records.len();
    let kept = filter(records, &terms);
    tracing::debug!(query, terms = terms.len(), before, after = kept.len(), "filtered records");
    kept
}

/// String form used for comparisons: strings verbatim, everything else as
/// compact JSON (`42`, `true`, `null`, `{"a":1}`).
pub fn stringify(value: FieldValue<'_>) -> Cow<'_, str> {
    match value {
        FieldValue::Text(s) => Cow::Borrowed(s),
        FieldValue::Json(Value::String(s)) => Cow::Borrowed(s),
        FieldValue::Json(other) => Cow::Owned(other.to_string()),
    }
}
