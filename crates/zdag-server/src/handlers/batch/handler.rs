//! Batch operation handler implementation.

use std::sync::Arc;

use tracing::{info, instrument};
use zdag_domain::resolver::{EdgeReader, EdgeWriter};
use zdag_domain::validation::validate_edge;

use super::types::{
    BatchOperationError, BatchOperationRequest, BatchOperationResult, MAX_BATCH_SIZE,
};
use crate::handlers::write::RelationWriter;

/// Handler for atomic batch mutations.
pub struct BatchOperationHandler<W, R> {
    writer: Arc<RelationWriter<W, R>>,
    max_batch_size: usize,
}

impl<W, R> BatchOperationHandler<W, R>
where
    W: EdgeWriter + 'static,
    R: EdgeReader + 'static,
{
    pub fn new(writer: Arc<RelationWriter<W, R>>) -> Self {
        Self {
            writer,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Validates a batch request without touching the store.
    pub fn validate(&self, request: &BatchOperationRequest) -> BatchOperationResult<()> {
        if request.operations.is_empty() {
            return Err(BatchOperationError::EmptyBatch);
        }
        if request.operations.len() > self.max_batch_size {
            return Err(BatchOperationError::BatchTooLarge {
                size: request.operations.len(),
                max: self.max_batch_size,
            });
        }
        for (index, operation) in request.operations.iter().enumerate() {
            validate_edge(&operation.edge).map_err(|err| {
                BatchOperationError::InvalidOperation {
                    index,
                    message: err.to_string(),
                }
            })?;
        }
        Ok(())
    }

    /// Validates and applies a batch; all operations succeed or none do.
    #[instrument(skip(self, request), fields(operations = request.operations.len()))]
    pub async fn apply(&self, request: BatchOperationRequest) -> BatchOperationResult<()> {
        self.validate(&request)?;
        self.writer.apply(&request.operations).await?;
        info!("batch applied");
        Ok(())
    }
}
