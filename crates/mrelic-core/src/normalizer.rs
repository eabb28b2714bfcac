//! Normalizer: maps arbitrary incoming payloads into canonical
//! [`LogRecord`](crate::LogRecord) values.
//!
//! Field resolution:
//!
//! | Field       | Source, first hit wins                                          |
//! |-------------|-----------------------------------------------------------------|
//! | `message`   | `message`, `msg`, `body`, else the whole payload as JSON        |
//! | `level`     | `level`, `severity`, else `"info"`                              |
//! | `service`   | transport header, `service`, `serviceName`, `service_name`, else `"system"` |
//! | `timestamp` | `timestamp` (see [`coerce_timestamp`]), else now                |
//!
//! An alias only counts when its value is "present": not null, not `false`,
//! not `0` and not the empty string. Every payload key other than the
//! canonical field names is kept in `attributes`, aliases included.

use serde_json::{Map, Value};

use crate::types::{LogId, LogRecord, Timestamp, TransportMeta, CANONICAL_FIELDS};

const MESSAGE_ALIASES: [&str; 3] = ["message", "msg", "body"];
const LEVEL_ALIASES: [&str; 2] = ["level", "severity"];
const SERVICE_ALIASES: [&str; 3] = ["service", "serviceName", "service_name"];

pub const DEFAULT_LEVEL: &str = "info";
pub const DEFAULT_SERVICE: &str = "system";

/// Normalize one payload. Never fails.
pub fn normalize(payload: &Value, meta: Option<&TransportMeta>) -> LogRecord {
    let header_service = meta
        .and_then(|m| m.service_name.as_deref())
        .filter(|s| !s.is_empty());

    let Value::Object(fields) = payload else {
        return normalize_scalar(payload, header_service);
    };

    let message = first_present(fields, &MESSAGE_ALIASES)
        .map(display)
        .unwrap_or_else(|| payload.to_string());
    let level = first_present(fields, &LEVEL_ALIASES)
        .map(display)
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let service = match header_service {
        Some(s) => s.to_string(),
        None => first_present(fields, &SERVICE_ALIASES)
            .map(display)
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
    };
    let timestamp = coerce_timestamp(fields.get("timestamp"));

    let attributes: Map<String, Value> = fields
        .iter()
        .filter(|(k, _)| !is_claimed(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    LogRecord {
        id: LogId::generate(),
        timestamp,
        message,
        level,
        service,
        attributes,
    }
}

/// Normalize a batch: arrays yield one record per element, anything else a
/// single record.
pub fn normalize_batch(payload: &Value, meta: Option<&TransportMeta>) -> Vec<LogRecord> {
    match payload {
        Value::Array(items) => items.iter().map(|item| normalize(item, meta)).collect(),
        single => vec![normalize(single, meta)],
    }
}

/// Canonicalize a payload `timestamp` value.
///
/// - number: epoch milliseconds, fraction truncated
/// - string containing `-`: assumed ISO-like, kept verbatim
/// - other non-empty string: epoch milliseconds from its leading numeric
///   prefix, so `"1705312800123ms"` still reads as a number
/// - missing, null, empty or structured: the current instant
///
/// Numbers that cannot be represented become [`Timestamp::INVALID`].
pub fn coerce_timestamp(raw: Option<&Value>) -> Timestamp {
    match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Timestamp::from_millis)
            .unwrap_or_else(|| millis_from_f64(n.as_f64())),
        Some(Value::String(s)) if s.contains('-') => Timestamp::verbatim(s.clone()),
        Some(Value::String(s)) if !s.is_empty() => millis_from_f64(leading_number(s)),
        _ => Timestamp::now(),
    }
}

/// Longest numeric prefix of `s` after leading whitespace, if any.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !matches!(c, '0'..='9' | '.' | '+' | '-' | 'e' | 'E'))
        .unwrap_or(s.len());
    (1..=end).rev().find_map(|len| s[..len].parse::<f64>().ok())
}

fn millis_from_f64(ms: Option<f64>) -> Timestamp {
    match ms {
        Some(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => {
            Timestamp::from_millis(ms.trunc() as i64)
        }
        _ => Timestamp::invalid(),
    }
}

fn normalize_scalar(payload: &Value, header_service: Option<&str>) -> LogRecord {
    let message = match payload {
        Value::String(s) if !s.is_empty() => s.clone(),
        other => other.to_string(),
    };
    LogRecord {
        id: LogId::generate(),
        timestamp: Timestamp::now(),
        message,
        level: DEFAULT_LEVEL.to_string(),
        service: header_service.unwrap_or(DEFAULT_SERVICE).to_string(),
        attributes: Map::new(),
    }
}

fn is_claimed(key: &str) -> bool {
    // `id` is assigned here, but a producer-supplied `id` is still kept as
    // an attribute; the canonical field shadows it on lookup.
    key != "id" && CANONICAL_FIELDS.contains(&key)
}

fn first_present<'a>(fields: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|v| is_present(v))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
