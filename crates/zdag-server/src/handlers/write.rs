//! Relation write handler.
//!
//! Every mutation is validated before the store is touched. With the cycle
//! guard enabled, creates are checked against a fresh snapshot and written
//! while holding a coordinator lock, so two concurrent creates cannot close
//! a cycle between them.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use zdag_domain::error::{DomainError, DomainResult};
use zdag_domain::model::{Action, Edge, EdgeFilter, Operation};
use zdag_domain::resolver::{EdgeReader, EdgeWriter, GraphResolver};
use zdag_domain::validation::validate_edge;

/// Validating front for all relation mutations.
pub struct RelationWriter<W, R> {
    writer: Arc<W>,
    resolver: Arc<GraphResolver<R>>,
    deny_cycles: bool,
    coordinator: Mutex<()>,
}

impl<W, R> RelationWriter<W, R>
where
    W: EdgeWriter + 'static,
    R: EdgeReader + 'static,
{
    pub fn new(writer: Arc<W>, resolver: Arc<GraphResolver<R>>) -> Self {
        Self {
            writer,
            resolver,
            deny_cycles: false,
            coordinator: Mutex::new(()),
        }
    }

    /// Rejects creates that would close a cycle.
    pub fn with_cycle_guard(mut self, deny_cycles: bool) -> Self {
        self.deny_cycles = deny_cycles;
        self
    }

    pub fn denies_cycles(&self) -> bool {
        self.deny_cycles
    }

    #[instrument(skip(self, edge), fields(edge = %edge))]
    pub async fn create(&self, edge: &Edge, exist_ok: bool) -> DomainResult<()> {
        validate_edge(edge)?;

        if !self.deny_cycles {
            return self.writer.create(edge, exist_ok).await;
        }
        let _turn = self.coordinator.lock().await;
        self.reject_cycles(&[Operation::create(edge.clone())]).await?;
        self.writer.create(edge, exist_ok).await
    }

    /// Removes one edge. Absent edges are not an error.
    #[instrument(skip(self, edge), fields(edge = %edge))]
    pub async fn delete(&self, edge: &Edge) -> DomainResult<bool> {
        validate_edge(edge)?;
        let existed = self.writer.delete(edge).await?;
        if !existed {
            debug!("delete of absent edge ignored");
        }
        Ok(existed)
    }

    /// Removes every edge matching any of `filters`.
    pub async fn delete_by_queries(&self, filters: &[EdgeFilter]) -> DomainResult<usize> {
        if filters.is_empty() {
            return Err(DomainError::InvalidRequest {
                message: "at least one query is required".to_string(),
            });
        }
        if let Some(index) = filters.iter().position(EdgeFilter::is_empty) {
            return Err(DomainError::InvalidRequest {
                message: format!("query at index {index} has no fields set"),
            });
        }
        let deleted = self.writer.delete_matching(filters).await?;
        debug!(queries = filters.len(), deleted, "deleted edges by query");
        Ok(deleted)
    }

    pub async fn clear_all(&self) -> DomainResult<()> {
        let _turn = self.coordinator.lock().await;
        self.writer.clear_all().await?;
        warn!("all relations cleared");
        Ok(())
    }

    /// Applies already validated operations as one atomic unit.
    pub async fn apply(&self, operations: &[Operation]) -> DomainResult<()> {
        if !self.deny_cycles {
            return self.writer.apply(operations).await;
        }
        let _turn = self.coordinator.lock().await;
        self.reject_cycles(operations).await?;
        self.writer.apply(operations).await
    }

    async fn reject_cycles(&self, operations: &[Operation]) -> DomainResult<()> {
        let creates = operations
            .iter()
            .any(|op| matches!(op.action, Action::Create | Action::CreateIfNotExist));
        if !creates {
            return Ok(());
        }
        match self.resolver.find_cycle(operations).await? {
            Some(report) => {
                warn!(edge = %report.edge, cycle = %report.describe(), "rejected cycle-closing edge");
                Err(DomainError::CycleDetected {
                    path: report.describe(),
                })
            }
            None => Ok(()),
        }
    }
}
