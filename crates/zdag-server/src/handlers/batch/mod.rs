//! Atomic batch mutations.
//!
//! A batch is validated as a whole before anything is written: it must be
//! non-empty, within the size limit and every edge must pass validation. The
//! operations are then applied in order as one atomic unit, so a later
//! operation sees the effect of an earlier one and a failing create leaves
//! the store untouched.

mod handler;
mod types;

pub use handler::BatchOperationHandler;
pub use types::{
    BatchOperationError, BatchOperationRequest, BatchOperationResult, MAX_BATCH_SIZE,
};

#[cfg(test)]
mod tests;
