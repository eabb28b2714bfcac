//! Test builders: ergonomic constructors for `LogRecord`s and seeded
//! coordinators.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use mrelic_core::{LogId, LogRecord, MemoryBackend, QueryCoordinator, Timestamp};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LogRecord`] fixtures.
///
/// ```rust
/// let record = RecordBuilder::new("timeout connecting to db")
///     .level("error")
///     .service("api")
///     .at(1_700_000_000_000)
///     .attr("request_id", "req-abc123")
///     .build();
/// ```
pub struct RecordBuilder {
    id: Option<String>,
    timestamp: Timestamp,
    message: String,
    level: String,
    service: String,
    attributes: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp: Timestamp::from_millis(0),
            message: message.into(),
            level: "info".to_string(),
            service: "test-service".to_string(),
            attributes: Map::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Timestamp as epoch milliseconds.
    pub fn at(mut self, ms: i64) -> Self {
        self.timestamp = Timestamp::from_millis(ms);
        self
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> LogRecord {
        LogRecord {
            id: self.id.map(LogId::from).unwrap_or_else(LogId::generate),
            timestamp: self.timestamp,
            message: self.message,
            level: self.level,
            service: self.service,
            attributes: self.attributes,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinators
// ---------------------------------------------------------------------------

/// An in-memory coordinator holding `records`, inserted in order.
pub fn coordinator_with(records: &[LogRecord]) -> QueryCoordinator<MemoryBackend> {
    let coordinator = QueryCoordinator::new(MemoryBackend::new());
    for record in records {
        coordinator.insert(record).expect("memory insert cannot fail");
    }
    coordinator
}

/// `n` records one second apart with rotating levels and services. Record
/// `i` has message `"event {i}"` and attribute `seq = i`.
pub fn sequential_records(n: usize) -> Vec<LogRecord> {
    const LEVELS: [&str; 4] = ["info", "warn", "error", "debug"];
    const SERVICES: [&str; 3] = ["api", "db", "worker"];
    (0..n)
        .map(|i| {
            RecordBuilder::new(format!("event {i}"))
                .id(format!("rec-{i:05}"))
                .at(1_700_000_000_000 + i as i64 * 1_000)
                .level(LEVELS[i % LEVELS.len()])
                .service(SERVICES[i % SERVICES.len()])
                .attr("seq", i as u64)
                .build()
        })
        .collect()
}
