//! Domain error types for relation graph operations.

use thiserror::Error;

use crate::validation::ValidationError;

/// Domain-specific errors for relation graph operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or reserved-word input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Strict creation of an edge that already exists.
    #[error("edge already exists: {edge}")]
    AlreadyExists { edge: String },

    /// Creating the edge would close a cycle in the relation graph.
    #[error("cycle detected in relation graph: {path}")]
    CycleDetected { path: String },

    /// Path enumeration hit one of its caps.
    #[error("path limit exceeded: more than {limit} {what}")]
    PathLimitExceeded { limit: usize, what: &'static str },

    /// Tree construction hit its node cap.
    #[error("tree limit exceeded: more than {max_nodes} nodes")]
    TreeLimitExceeded { max_nodes: usize },

    /// Depth limit exceeded during graph traversal.
    #[error("depth limit exceeded (max: {max_depth})")]
    DepthLimitExceeded { max_depth: u32 },

    /// Timeout during traversal.
    #[error("timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The caller cancelled the query.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid request outside of edge validation (empty batch, bad filter).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Storage operation failed.
    #[error("storage operation failed: {reason}")]
    StorageOperationFailed { reason: String },

    /// Broken invariant or failed background task.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
