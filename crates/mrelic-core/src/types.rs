//! Core types for mrelic-core.
//!
//! This module defines the canonical [`LogRecord`] persisted and filtered by
//! every layer, its identifier and timestamp newtypes, and the
//! [`TransportMeta`] that may accompany an incoming payload.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical field names. An attribute with one of these names is shadowed by
/// the record's own field on lookup and when flattened.
pub const CANONICAL_FIELDS: [&str; 5] = ["id", "timestamp", "message", "level", "service"];

// ---------------------------------------------------------------------------
// LogId
// ---------------------------------------------------------------------------

/// Opaque, globally unique record identifier. Assigned once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(String);

impl LogId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LogId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Canonical timestamp string (`YYYY-MM-DDTHH:MM:SS.mmmZ`).
///
/// Ordering is plain string ordering, which for canonical values is
/// chronological. Strings that already looked ISO-like at ingestion are kept
/// verbatim. The [`Timestamp::INVALID`] sentinel compares greater than every
/// canonical value because it starts with a letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Sentinel stored when a numeric timestamp cannot be interpreted.
    pub const INVALID: &'static str = "Invalid Date";

    const FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Format `dt` canonically. Instants outside years 0..=9999 have no
    /// sortable four-digit form and become the invalid sentinel.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        if !(0..=9999).contains(&dt.year()) {
            return Self::invalid();
        }
        Self(dt.format(Self::FORMAT).to_string())
    }

    /// Interpret `ms` as milliseconds since the Unix epoch.
    pub fn from_millis(ms: i64) -> Self {
        DateTime::from_timestamp_millis(ms)
            .map(Self::from_datetime)
            .unwrap_or_else(Self::invalid)
    }

    /// Keep `raw` exactly as given.
    pub fn verbatim(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn invalid() -> Self {
        Self(Self::INVALID.to_string())
    }

    pub fn is_invalid(&self) -> bool {
        self.0 == Self::INVALID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into an instant, if the stored string is RFC 3339.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// LogRecord
// ---------------------------------------------------------------------------

/// The canonical, immutable unit of storage and filtering.
///
/// `message`, `level` and `service` are always populated by the normalizer.
/// Everything else the producer sent lives in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: LogId,
    pub timestamp: Timestamp,
    pub message: String,
    pub level: String,
    pub service: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// A borrowed view of one record field, used by the filter evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Json(&'a Value),
}

impl LogRecord {
    /// Look up `key`, checking the canonical fields before `attributes`.
    pub fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => Some(FieldValue::Text(self.id.as_str())),
            "timestamp" => Some(FieldValue::Text(self.timestamp.as_str())),
            "message" => Some(FieldValue::Text(&self.message)),
            "level" => Some(FieldValue::Text(&self.level)),
            "service" => Some(FieldValue::Text(&self.service)),
            _ => self.attributes.get(key).map(FieldValue::Json),
        }
    }

    /// Every field in display order: canonical fields, then attributes in
    /// payload order. Attributes shadowed by a canonical name are skipped.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldValue<'_>)> {
        let canonical = [
            ("id", FieldValue::Text(self.id.as_str())),
            ("timestamp", FieldValue::Text(self.timestamp.as_str())),
            ("message", FieldValue::Text(&self.message)),
            ("level", FieldValue::Text(&self.level)),
            ("service", FieldValue::Text(&self.service)),
        ];
        let attributes = self
            .attributes
            .iter()
            .filter(|(k, _)| !CANONICAL_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), FieldValue::Json(v)));
        canonical.into_iter().chain(attributes)
    }

    /// Flatten into a single JSON object: canonical fields, then attributes.
    pub fn to_flat_json(&self) -> Value {
        let mut out = Map::with_capacity(5 + self.attributes.len());
        out.insert("id".into(), Value::String(self.id.to_string()));
        out.insert("timestamp".into(), Value::String(self.timestamp.to_string()));
        out.insert("message".into(), Value::String(self.message.clone()));
        out.insert("level".into(), Value::String(self.level.clone()));
        out.insert("service".into(), Value::String(self.service.clone()));
        for (k, v) in &self.attributes {
            if !CANONICAL_FIELDS.contains(&k.as_str()) {
                out.insert(k.clone(), v.clone());
            }
        }
        Value::Object(out)
    }
}

// ---------------------------------------------------------------------------
// TransportMeta
// ---------------------------------------------------------------------------

/// Metadata supplied by the transport alongside a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportMeta {
    /// Value of the `service.name` header, if the producer sent one.
    pub service_name: Option<String>,
}

impl TransportMeta {
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service_name: Some(service.into()),
        }
    }
}
