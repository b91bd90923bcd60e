//! Storage error types.

use std::time::Duration;

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Edge already exists and the caller asked for strict creation.
    #[error("duplicate edge: {edge}")]
    DuplicateEdge { edge: String },

    /// Invalid filter error.
    #[error("invalid filter: {message}")]
    InvalidFilter { message: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Malformed or stale continuation token.
    #[error("invalid continuation token: {token}")]
    InvalidContinuationToken { token: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Health report returned by [`EdgeStore::health_check`](crate::EdgeStore::health_check).
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency: Duration,
    /// Number of edges currently stored.
    pub edge_count: usize,
    pub message: Option<String>,
}
