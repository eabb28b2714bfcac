//! In-memory backend.

use std::collections::BTreeSet;

use parking_lot::RwLock;

use super::{Column, Deletion, LogBackend, Selection, StoreResult, StoredRow};

/// Thread-safe in-memory row store.
///
/// Rows are kept sorted ascending by timestamp, with later inserts placed
/// after earlier ones on ties, so iterating in reverse yields the
/// newest-first order the trait promises.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: RwLock<Vec<StoredRow>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows in insertion order.
    pub fn from_rows(rows: impl IntoIterator<Item = StoredRow>) -> Self {
        let backend = Self::new();
        {
            let mut guard = backend.rows.write();
            for row in rows {
                insert_sorted(&mut guard, row);
            }
        }
        backend
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// All rows, oldest first.
    pub fn snapshot(&self) -> Vec<StoredRow> {
        self.rows.read().clone()
    }

    /// Rows that `deletion` would leave behind, and how many it removes.
    /// Nothing is modified.
    pub(crate) fn survivors(&self, deletion: &Deletion) -> (Vec<StoredRow>, usize) {
        let rows = self.rows.read();
        let kept: Vec<StoredRow> = rows.iter().filter(|r| !deletion.matches(r)).cloned().collect();
        let removed = rows.len() - kept.len();
        (kept, removed)
    }

    /// Swap in a new row set, which must already be sorted.
    pub(crate) fn replace(&self, rows: Vec<StoredRow>) {
        *self.rows.write() = rows;
    }
}

fn insert_sorted(rows: &mut Vec<StoredRow>, row: StoredRow) {
    let at = rows.partition_point(|r| r.timestamp <= row.timestamp);
    rows.insert(at, row);
}

impl LogBackend for MemoryBackend {
    fn insert(&self, row: StoredRow) -> StoreResult<()> {
        insert_sorted(&mut self.rows.write(), row);
        Ok(())
    }

    fn insert_many(&self, rows: Vec<StoredRow>) -> StoreResult<()> {
        let mut guard = self.rows.write();
        for row in rows {
            insert_sorted(&mut guard, row);
        }
        Ok(())
    }

    fn select(&self, selection: &Selection) -> StoreResult<Vec<StoredRow>> {
        let rows = self.rows.read();
        let matching = rows
            .iter()
            .rev()
            .filter(|r| selection.matches(r))
            .skip(selection.offset.unwrap_or(0));
        let out = match selection.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(out)
    }

    fn count(&self, selection: &Selection) -> StoreResult<usize> {
        Ok(self.rows.read().iter().filter(|r| selection.matches(r)).count())
    }

    fn distinct(&self, column: Column) -> StoreResult<Vec<String>> {
        let rows = self.rows.read();
        let values: BTreeSet<&str> = rows.iter().map(|r| column.get(r)).collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    fn delete(&self, deletion: &Deletion) -> StoreResult<usize> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !deletion.matches(r));
        Ok(before - rows.len())
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        Ok(self.rows.read().iter().map(|r| r.byte_len() as u64).sum())
    }
}
