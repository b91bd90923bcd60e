//! Data types for batch operations.

use serde::Deserialize;
use zdag_domain::error::DomainError;
use zdag_domain::model::Operation;

/// Default operation limit for one batch request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Request body of a batch operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchOperationRequest {
    pub operations: Vec<Operation>,
}

impl BatchOperationRequest {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

/// Errors that can occur during batch operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchOperationError {
    /// The batch request is empty.
    #[error("batch request cannot be empty")]
    EmptyBatch,

    /// The batch request exceeds the maximum allowed size.
    #[error("batch size {size} exceeds maximum allowed {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// An operation carries an invalid edge.
    #[error("invalid operation at index {index}: {message}")]
    InvalidOperation { index: usize, message: String },

    /// The store or cycle guard rejected the batch.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Result type for batch operations.
pub type BatchOperationResult<T> = Result<T, BatchOperationError>;
