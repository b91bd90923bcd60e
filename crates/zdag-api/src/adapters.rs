//! Adapters that bridge the storage layer to the domain layer.
//!
//! The domain layer (zdag-domain) defines abstract traits for data access:
//! - `EdgeReader`: point-in-time graph snapshots for traversals
//! - `EdgeWriter`: atomic mutations
//!
//! The storage layer (zdag-storage) implements `EdgeStore` over its own flat
//! edge representation. The adapters here convert between the two.

use std::sync::Arc;

use async_trait::async_trait;

use zdag_domain::error::{DomainError, DomainResult};
use zdag_domain::model::{Action, Edge, EdgeFilter, EntityRef, Operation};
use zdag_domain::resolver::{EdgeReader, EdgeWriter, GraphSnapshot};
use zdag_storage::{EdgeIndex, EdgeStore, NodeKey, StorageError, StoredEdge, WriteOperation};

/// Converts a domain edge to its stored form.
pub fn to_stored(edge: &Edge) -> StoredEdge {
    StoredEdge::new(
        edge.object.namespace.clone(),
        edge.object.name.clone(),
        edge.relation(),
        edge.subject.namespace.clone(),
        edge.subject.name.clone(),
        edge.subject.relation.clone(),
    )
}

/// Converts a stored edge back to the domain form.
pub fn from_stored(stored: &StoredEdge) -> Edge {
    Edge::new(
        EntityRef::with_relation(
            stored.object_namespace.clone(),
            stored.object_name.clone(),
            stored.relation.clone(),
        ),
        EntityRef {
            namespace: stored.subject_namespace.clone(),
            name: stored.subject_name.clone(),
            relation: stored.subject_relation.clone(),
        },
    )
}

fn to_node(entity: &EntityRef) -> NodeKey {
    NodeKey::new(
        entity.namespace.clone(),
        entity.name.clone(),
        entity.relation.clone(),
    )
}

fn from_node(node: NodeKey) -> EntityRef {
    EntityRef {
        namespace: node.namespace,
        name: node.name,
        relation: node.relation,
    }
}

/// Converts a domain filter to the storage filter with the same meaning.
pub fn to_storage_filter(filter: &EdgeFilter) -> zdag_storage::EdgeFilter {
    zdag_storage::EdgeFilter {
        object_namespace: filter.object_namespace.clone(),
        object_name: filter.object_name.clone(),
        relation: filter.relation.clone(),
        subject_namespace: filter.subject_namespace.clone(),
        subject_name: filter.subject_name.clone(),
        subject_relation: filter.subject_relation.clone(),
    }
}

/// Maps storage failures onto the domain error taxonomy.
pub fn storage_error(err: StorageError) -> DomainError {
    match err {
        StorageError::DuplicateEdge { edge } => DomainError::AlreadyExists { edge },
        StorageError::InvalidFilter { message } | StorageError::InvalidInput { message } => {
            DomainError::InvalidRequest { message }
        }
        StorageError::InvalidContinuationToken { token } => DomainError::InvalidRequest {
            message: format!("invalid continuation token: {token}"),
        },
        StorageError::InternalError { message } => {
            DomainError::StorageOperationFailed { reason: message }
        }
    }
}

/// Graph view over an immutable [`EdgeIndex`].
pub struct IndexSnapshot {
    index: Arc<EdgeIndex>,
}

impl IndexSnapshot {
    pub fn new(index: Arc<EdgeIndex>) -> Self {
        Self { index }
    }
}

impl GraphSnapshot for IndexSnapshot {
    fn outgoing(&self, node: &EntityRef) -> Vec<Edge> {
        self.index.edges_from(&to_node(node)).map(from_stored).collect()
    }

    fn incoming(&self, node: &EntityRef) -> Vec<Edge> {
        self.index.edges_to(&to_node(node)).map(from_stored).collect()
    }

    fn subjects(&self) -> Vec<EntityRef> {
        self.index.subjects().into_iter().map(from_node).collect()
    }

    fn sources(&self) -> Vec<EntityRef> {
        self.index.sources().into_iter().map(from_node).collect()
    }
}

/// Adapter that implements `EdgeReader` using an `EdgeStore`.
pub struct StoreEdgeReader<S: EdgeStore> {
    storage: Arc<S>,
}

impl<S: EdgeStore> StoreEdgeReader<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: EdgeStore> EdgeReader for StoreEdgeReader<S> {
    async fn snapshot(&self) -> DomainResult<Arc<dyn GraphSnapshot>> {
        let index = self.storage.snapshot().await.map_err(storage_error)?;
        Ok(Arc::new(IndexSnapshot::new(index)))
    }
}

/// Adapter that implements `EdgeWriter` using an `EdgeStore`.
pub struct StoreEdgeWriter<S: EdgeStore> {
    storage: Arc<S>,
}

impl<S: EdgeStore> StoreEdgeWriter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: EdgeStore> EdgeWriter for StoreEdgeWriter<S> {
    async fn create(&self, edge: &Edge, exist_ok: bool) -> DomainResult<()> {
        self.storage
            .create_edge(to_stored(edge), exist_ok)
            .await
            .map_err(storage_error)
    }

    async fn delete(&self, edge: &Edge) -> DomainResult<bool> {
        self.storage
            .delete_edge(&to_stored(edge))
            .await
            .map_err(storage_error)
    }

    async fn delete_matching(&self, filters: &[EdgeFilter]) -> DomainResult<usize> {
        let filters: Vec<_> = filters.iter().map(to_storage_filter).collect();
        self.storage
            .delete_matching(&filters)
            .await
            .map_err(storage_error)
    }

    async fn apply(&self, operations: &[Operation]) -> DomainResult<()> {
        let operations = operations
            .iter()
            .map(|op| {
                let edge = to_stored(&op.edge);
                match op.action {
                    Action::Create => WriteOperation::Create {
                        edge,
                        exist_ok: false,
                    },
                    Action::CreateIfNotExist => WriteOperation::Create {
                        edge,
                        exist_ok: true,
                    },
                    Action::Delete => WriteOperation::Delete { edge },
                }
            })
            .collect();
        self.storage
            .write_batch(operations)
            .await
            .map_err(storage_error)
    }

    async fn clear_all(&self) -> DomainResult<()> {
        self.storage.clear_all().await.map_err(storage_error)
    }
}
