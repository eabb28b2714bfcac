//! Store: the single I/O boundary of the core.
//!
//! [`LogBackend`] is the narrow, relational-shaped interface the
//! [`QueryCoordinator`](crate::QueryCoordinator) talks to: insert a row,
//! select rows by simple predicates (newest first, optional limit/offset),
//! count, list distinct column values, and bulk delete. Two backends ship with
//! the crate:
//!
//! - [`MemoryBackend`]: rows held in a timestamp-sorted vector
//! - [`FileBackend`]: the same, persisted as JSON lines on disk

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::types::{LogId, LogRecord, Timestamp};

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Result type alias for backend operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One stored row. Attributes are kept as a serialized JSON blob in `data`,
/// which is also what the store-side substring predicate searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: String,
    pub timestamp: String,
    pub message: String,
    pub level: String,
    pub service: String,
    pub data: String,
}

impl StoredRow {
    pub fn from_record(record: &LogRecord) -> StoreResult<Self> {
        Ok(Self {
            id: record.id.to_string(),
            timestamp: record.timestamp.to_string(),
            message: record.message.clone(),
            level: record.level.clone(),
            service: record.service.clone(),
            data: serde_json::to_string(&record.attributes)?,
        })
    }

    /// Rebuild the full record. An empty blob means no attributes.
    pub fn into_record(self) -> StoreResult<LogRecord> {
        let attributes: Map<String, Value> = if self.data.is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&self.data)?
        };
        Ok(LogRecord {
            id: LogId::from(self.id),
            timestamp: Timestamp::verbatim(self.timestamp),
            message: self.message,
            level: self.level,
            service: self.service,
            attributes,
        })
    }

    /// Approximate footprint in bytes.
    pub fn byte_len(&self) -> usize {
        self.id.len()
            + self.timestamp.len()
            + self.message.len()
            + self.level.len()
            + self.service.len()
            + self.data.len()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Equality and range predicates every backend can evaluate.
///
/// Time bounds are inclusive and compared as canonical timestamp strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicates {
    pub level: Option<String>,
    pub service: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Predicates {
    pub fn matches(&self, row: &StoredRow) -> bool {
        self.level.as_ref().map_or(true, |l| row.level == *l)
            && self.service.as_ref().map_or(true, |s| row.service == *s)
            && self.start.as_ref().map_or(true, |s| row.timestamp >= *s)
            && self.end.as_ref().map_or(true, |e| row.timestamp <= *e)
    }
}

/// A select/count request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub predicates: Predicates,
    /// Case-insensitive substring OR-ed across message, service, level and
    /// the attributes blob.
    pub contains: Option<String>,
    /// Ignored by [`LogBackend::count`].
    pub limit: Option<usize>,
    /// Ignored by [`LogBackend::count`].
    pub offset: Option<usize>,
}

impl Selection {
    pub fn matches(&self, row: &StoredRow) -> bool {
        if !self.predicates.matches(row) {
            return false;
        }
        match &self.contains {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [&row.message, &row.service, &row.level, &row.data]
                    .iter()
                    .any(|col| col.to_lowercase().contains(&needle))
            }
        }
    }
}

/// A bulk delete request. Rows strictly older than `before` are removed.
/// An empty deletion removes everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deletion {
    pub service: Option<String>,
    pub before: Option<String>,
}

impl Deletion {
    pub fn matches(&self, row: &StoredRow) -> bool {
        self.service.as_ref().map_or(true, |s| row.service == *s)
            && self.before.as_ref().map_or(true, |b| row.timestamp < *b)
    }
}

/// Columns with store-side distinct-value support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Level,
    Service,
}

impl Column {
    pub fn get<'a>(&self, row: &'a StoredRow) -> &'a str {
        match self {
            Column::Level => &row.level,
            Column::Service => &row.service,
        }
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Storage backend behind the coordinator.
///
/// Implementations serialize their own concurrent access. Results from
/// [`select`](LogBackend::select) are ordered newest first; rows with equal
/// timestamps come back most-recently-inserted first.
pub trait LogBackend: Send + Sync {
    /// Insert one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be persisted.
    fn insert(&self, row: StoredRow) -> StoreResult<()>;

    /// Insert several rows. Backends with a cheaper bulk path override this.
    ///
    /// # Errors
    ///
    /// Returns the first insert error.
    fn insert_many(&self, rows: Vec<StoredRow>) -> StoreResult<()> {
        for row in rows {
            self.insert(row)?;
        }
        Ok(())
    }

    /// Matching rows, newest first, after `offset`, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn select(&self, selection: &Selection) -> StoreResult<Vec<StoredRow>>;

    /// Number of matching rows, ignoring limit and offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn count(&self, selection: &Selection) -> StoreResult<usize>;

    /// Distinct values of `column`, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn distinct(&self, column: Column) -> StoreResult<Vec<String>>;

    /// Remove matching rows, returning how many went. All or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be persisted; no rows are
    /// removed in that case.
    fn delete(&self, deletion: &Deletion) -> StoreResult<usize>;

    /// Storage footprint in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size_bytes(&self) -> StoreResult<u64>;
}
