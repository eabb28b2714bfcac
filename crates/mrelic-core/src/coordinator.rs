//! Query coordinator: the only component that talks to the store.
//!
//! Owns a [`LogBackend`] for its lifetime; opening and closing the backend is
//! the caller's business. Each request is planned with
//! [`ExecutionPlan::build`] and executed either entirely in the store
//! ([`SimplePlan`]) or as a bounded store scan followed by in-memory
//! filtering and pagination ([`ScanPlan`]).

use serde::Serialize;
use serde_json::Value;

use crate::config::QueryConfig;
use crate::error::Result;
use crate::normalizer::normalize_batch;
use crate::plan::{DeleteCriteria, ExecutionPlan, QueryCriteria, ScanPlan, SimplePlan};
use crate::search::filter;
use crate::store::{Column, LogBackend, StoreResult, StoredRow};
use crate::types::{LogRecord, TransportMeta};

/// One page of results plus the facet lists used to populate filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub records: Vec<LogRecord>,
    /// Matches across all pages.
    pub total_count: usize,
    /// Every distinct level in the store, independent of the query.
    pub levels: Vec<String>,
    /// Every distinct service in the store, independent of the query.
    pub services: Vec<String>,
}

pub struct QueryCoordinator<B> {
    backend: B,
    config: QueryConfig,
}

impl<B: LogBackend> QueryCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, QueryConfig::default())
    }

    pub fn with_config(backend: B, config: QueryConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn plan(&self, criteria: &QueryCriteria) -> ExecutionPlan {
        ExecutionPlan::build(criteria, &self.config)
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Normalize and store a payload. Arrays are treated as batches.
    pub fn ingest(&self, payload: &Value, meta: Option<&TransportMeta>) -> Result<Vec<LogRecord>> {
        let records = normalize_batch(payload, meta);
        let rows = records
            .iter()
            .map(StoredRow::from_record)
            .collect::<StoreResult<Vec<_>>>()?;
        self.backend.insert_many(rows)?;
        tracing::debug!(count = records.len(), "ingested records");
        Ok(records)
    }

    /// Store an already-normalized record.
    pub fn insert(&self, record: &LogRecord) -> Result<()> {
        self.backend.insert(StoredRow::from_record(record)?)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Retrieval
    // -----------------------------------------------------------------------

    /// One page of matching records, the total match count and the facets.
    pub fn query(&self, criteria: &QueryCriteria) -> Result<QueryResult> {
        let records = self.records(criteria)?;
        let total_count = self.count(criteria)?;
        Ok(QueryResult {
            records,
            total_count,
            levels: self.levels()?,
            services: self.services()?,
        })
    }

    /// One page of matching records, newest first.
    pub fn records(&self, criteria: &QueryCriteria) -> Result<Vec<LogRecord>> {
        warn_on_inverted_range(criteria);
        let plan = self.plan(criteria);
        self.execute(&plan)
    }

    /// Number of matching records across all pages.
    ///
    /// Advanced queries are counted by running the unpaginated scan and
    /// taking its length, so the count is bounded by the candidate budget.
    pub fn count(&self, criteria: &QueryCriteria) -> Result<usize> {
        let unpaginated = criteria.unpaginated();
        match self.plan(&unpaginated) {
            ExecutionPlan::Simple(plan) => Ok(self.backend.count(&plan.selection)?),
            scan @ ExecutionPlan::Scan(_) => Ok(self.execute(&scan)?.len()),
        }
    }

    /// Run a previously built plan.
    pub fn execute(&self, plan: &ExecutionPlan) -> Result<Vec<LogRecord>> {
        match plan {
            ExecutionPlan::Simple(plan) => self.execute_simple(plan),
            ExecutionPlan::Scan(plan) => self.execute_scan(plan),
        }
    }

    fn execute_simple(&self, plan: &SimplePlan) -> Result<Vec<LogRecord>> {
        let rows = self.backend.select(&plan.selection)?;
        tracing::debug!(rows = rows.len(), "simple plan executed in store");
        Ok(to_records(rows)?)
    }

    fn execute_scan(&self, plan: &ScanPlan) -> Result<Vec<LogRecord>> {
        let rows = self.backend.select(&plan.selection)?;
        let candidates = rows.len();
        let matched = filter(to_records(rows)?, &plan.terms);
        let total = matched.len();

        let page: Vec<LogRecord> = matched
            .into_iter()
            .skip(plan.offset)
            .take(plan.limit.unwrap_or(usize::MAX))
            .collect();

        tracing::debug!(
            candidates,
            budget = plan.candidate_budget,
            matched = total,
            returned = page.len(),
            "scan plan filtered in memory"
        );
        Ok(page)
    }

    // -----------------------------------------------------------------------
    // Facets
    // -----------------------------------------------------------------------

    pub fn levels(&self) -> Result<Vec<String>> {
        Ok(self.backend.distinct(Column::Level)?)
    }

    pub fn services(&self) -> Result<Vec<String>> {
        Ok(self.backend.distinct(Column::Service)?)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Bulk delete by service and age, always pushed down to the store.
    pub fn delete(&self, criteria: &DeleteCriteria) -> Result<usize> {
        let removed = self.backend.delete(&criteria.to_deletion())?;
        tracing::info!(
            service = criteria.service.as_deref().unwrap_or("*"),
            before = criteria.end_date.as_deref().unwrap_or("*"),
            removed,
            "deleted records"
        );
        Ok(removed)
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<usize> {
        self.delete(&DeleteCriteria::default())
    }

    /// Storage footprint in bytes, as reported by the backend.
    pub fn storage_size(&self) -> Result<u64> {
        Ok(self.backend.size_bytes()?)
    }
}

fn to_records(rows: Vec<StoredRow>) -> StoreResult<Vec<LogRecord>> {
    rows.into_iter().map(StoredRow::into_record).collect()
}

// An inverted range is not rejected; it simply matches nothing.
fn warn_on_inverted_range(criteria: &QueryCriteria) {
    if let (Some(start), Some(end)) = (&criteria.start_date, &criteria.end_date) {
        if !start.is_empty() && !end.is_empty() && start > end {
            tracing::debug!(%start, %end, "start date is after end date; result will be empty");
        }
    }
}
