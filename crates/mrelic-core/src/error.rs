//! Error types for mrelic-core.
//!
//! Parsing, normalization and filter evaluation are total and never fail.
//! The only fallible boundary is the store, plus loading configuration.

use thiserror::Error;

/// Failures raised by a [`LogBackend`](crate::store::LogBackend).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced to callers of the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The store failed. Never retried; surfaced as a single failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Configuration could not be loaded or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The configuration file could not be created.
    #[error("config file error: {0}")]
    ConfigFile(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
