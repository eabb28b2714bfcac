//! mrelic-core: structured log ingestion, storage and querying.
//!
//! This crate exposes the pipeline layers as public modules, plus the shared
//! types used across all of them.
//!
//! # Architecture
//!
//! ```text
//! payload ──► normalizer ──► store ◄── coordinator ◄── query
//!                                          │
//!                                  plan ───┴─── search
//! ```
//!
//! The [`QueryCoordinator`] is the only component that touches the store. It
//! classifies each query, pushes simple ones down to the store, and runs
//! advanced ones as a bounded scan filtered in memory.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod plan;
pub mod search;
pub mod store;
pub mod types;

pub use config::{Config, QueryConfig};
pub use coordinator::{QueryCoordinator, QueryResult};
pub use error::{CoreError, Result, StoreError};
pub use export::{render, OutputFormat};
pub use normalizer::{normalize, normalize_batch};
pub use plan::{is_advanced, DeleteCriteria, ExecutionPlan, QueryCriteria};
pub use search::{parse, SearchTerm, TermKind};
pub use store::{FileBackend, LogBackend, MemoryBackend};
pub use types::{LogId, LogRecord, Timestamp, TransportMeta};
