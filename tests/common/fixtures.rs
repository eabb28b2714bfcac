//! Static payload corpora used across harnesses.

use serde_json::Value;

/// JSON payloads in the shapes producers actually send.
pub const CORPUS_JSON: &[&str] = &[
    r#"{"timestamp":1705312800000,"level":"info","service":"api-gateway","message":"Server started","port":8080}"#,
    r#"{"timestamp":"2024-01-15T10:00:01.000Z","severity":"error","serviceName":"payments","msg":"Connection refused","host":"db.internal","port":5432}"#,
    r#"{"timestamp":"1705312802123","level":"warn","service_name":"orders","body":"Slow query","duration_ms":4200}"#,
    r#"{"level":"debug","message":"Cache miss","key":"user:42","ttl":300}"#,
    r#"{"timestamp":1705312804000,"level":"error","service":"payments","message":"payment gateway timeout","request_id":"req-abc123","http":{"status":504,"route":"/api/v1/payments"}}"#,
    r#"{"timestamp":1705312805000,"level":"info","service":"auth","message":"Token validated","user":{"id":"usr-999","roles":["admin","ops"]}}"#,
];

/// Payloads that exercise the normalizer's fallbacks.
pub const CORPUS_ODD: &[&str] = &[
    r#"{}"#,
    r#"{"message":"","msg":"fallback wins"}"#,
    r#"{"level":0,"severity":"warn"}"#,
    r#"{"timestamp":"not a number"}"#,
    r#"{"timestamp":1e300}"#,
    r#""just a string""#,
    r#"42"#,
    r#"null"#,
];

pub fn parse_corpus(lines: &[&str]) -> Vec<Value> {
    lines
        .iter()
        .map(|l| serde_json::from_str(l).expect("fixture must be valid JSON"))
        .collect()
}
