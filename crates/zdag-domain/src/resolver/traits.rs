//! Traits for storage operations needed by the resolver and mutation handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{Edge, EdgeFilter, EntityRef, Operation};

/// A consistent, immutable view of the relation graph.
///
/// Lookups are synchronous so traversals can run on a blocking thread
/// without holding any lock.
pub trait GraphSnapshot: Send + Sync {
    /// Edges whose subject is `node`, in insertion order.
    fn outgoing(&self, node: &EntityRef) -> Vec<Edge>;

    /// Edges whose object is `node`, in insertion order.
    fn incoming(&self, node: &EntityRef) -> Vec<Edge>;

    /// Distinct subjects of any edge, in order of first appearance.
    fn subjects(&self) -> Vec<EntityRef>;

    /// Subjects that are never the object of an edge, in order of first
    /// appearance.
    fn sources(&self) -> Vec<EntityRef>;
}

/// Trait for obtaining snapshots of the relation graph.
#[async_trait]
pub trait EdgeReader: Send + Sync {
    /// Returns a point-in-time snapshot. Later writes are not visible in it.
    async fn snapshot(&self) -> DomainResult<Arc<dyn GraphSnapshot>>;
}

/// Trait for mutating the relation graph. Every call is atomic.
#[async_trait]
pub trait EdgeWriter: Send + Sync {
    /// Inserts an edge; duplicates fail with `AlreadyExists` unless `exist_ok`.
    async fn create(&self, edge: &Edge, exist_ok: bool) -> DomainResult<()>;

    /// Removes an edge. Returns whether it existed.
    async fn delete(&self, edge: &Edge) -> DomainResult<bool>;

    /// Removes every edge matching any filter. Returns the number removed.
    async fn delete_matching(&self, filters: &[EdgeFilter]) -> DomainResult<usize>;

    /// Applies all operations or none of them.
    async fn apply(&self, operations: &[Operation]) -> DomainResult<()>;

    /// Removes every edge.
    async fn clear_all(&self) -> DomainResult<()>;
}
