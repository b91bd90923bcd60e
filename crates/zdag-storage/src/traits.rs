//! EdgeStore trait definition and the stored representations it works with.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{HealthStatus, StorageError, StorageResult};
use crate::index::EdgeIndex;

/// Default number of edges per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// A graph node: `namespace:name` optionally qualified by `#relation`.
///
/// Object nodes always carry a relation. Subject nodes carry one only when
/// they stand for a userset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub namespace: String,
    pub name: String,
    pub relation: Option<String>,
}

impl NodeKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        relation: Option<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            relation,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if let Some(relation) = &self.relation {
            write!(f, "#{relation}")?;
        }
        Ok(())
    }
}

/// A stored edge: `object_namespace:object_name#relation@subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredEdge {
    pub object_namespace: String,
    pub object_name: String,
    pub relation: String,
    pub subject_namespace: String,
    pub subject_name: String,
    pub subject_relation: Option<String>,
}

impl StoredEdge {
    pub fn new(
        object_namespace: impl Into<String>,
        object_name: impl Into<String>,
        relation: impl Into<String>,
        subject_namespace: impl Into<String>,
        subject_name: impl Into<String>,
        subject_relation: Option<String>,
    ) -> Self {
        Self {
            object_namespace: object_namespace.into(),
            object_name: object_name.into(),
            relation: relation.into(),
            subject_namespace: subject_namespace.into(),
            subject_name: subject_name.into(),
            subject_relation,
        }
    }

    /// The node this edge points at.
    pub fn object_node(&self) -> NodeKey {
        NodeKey::new(
            self.object_namespace.clone(),
            self.object_name.clone(),
            Some(self.relation.clone()),
        )
    }

    /// The node this edge starts from.
    pub fn subject_node(&self) -> NodeKey {
        NodeKey::new(
            self.subject_namespace.clone(),
            self.subject_name.clone(),
            self.subject_relation.clone(),
        )
    }
}

impl fmt::Display for StoredEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}:{}",
            self.object_namespace,
            self.object_name,
            self.relation,
            self.subject_namespace,
            self.subject_name
        )?;
        if let Some(relation) = &self.subject_relation {
            write!(f, "#{relation}")?;
        }
        Ok(())
    }
}

/// Partial filter over the identity fields of an edge.
///
/// `None` matches anything. `subject_relation: Some("")` matches only edges
/// whose subject has no relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub object_namespace: Option<String>,
    pub object_name: Option<String>,
    pub relation: Option<String>,
    pub subject_namespace: Option<String>,
    pub subject_name: Option<String>,
    pub subject_relation: Option<String>,
}

impl EdgeFilter {
    /// Returns true when no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.object_namespace.is_none()
            && self.object_name.is_none()
            && self.relation.is_none()
            && self.subject_namespace.is_none()
            && self.subject_name.is_none()
            && self.subject_relation.is_none()
    }

    pub fn matches(&self, edge: &StoredEdge) -> bool {
        fn field(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f == value)
        }

        let subject_relation = match self.subject_relation.as_deref() {
            None => true,
            Some("") => edge.subject_relation.is_none(),
            Some(rel) => edge.subject_relation.as_deref() == Some(rel),
        };

        field(&self.object_namespace, &edge.object_namespace)
            && field(&self.object_name, &edge.object_name)
            && field(&self.relation, &edge.relation)
            && field(&self.subject_namespace, &edge.subject_namespace)
            && field(&self.subject_name, &edge.subject_name)
            && subject_relation
    }
}

/// A single step of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOperation {
    /// Insert an edge. With `exist_ok = false` an existing edge fails the batch.
    Create { edge: StoredEdge, exist_ok: bool },
    /// Remove an edge. Absent edges are ignored.
    Delete { edge: StoredEdge },
}

/// Pagination options for list operations.
#[derive(Debug, Clone, Default)]
pub struct PaginationOptions {
    pub page_size: Option<u32>,
    pub continuation_token: Option<String>,
}

/// A page of results.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Present when more items follow.
    pub continuation_token: Option<String>,
}

/// Abstract storage interface for the relation graph.
///
/// Implementations must be thread-safe and apply every mutating call as one
/// atomic unit: readers either see all of its effects or none of them.
#[async_trait]
pub trait EdgeStore: Send + Sync + 'static {
    /// Inserts an edge. Duplicates are a no-op when `exist_ok` is set and
    /// [`StorageError::DuplicateEdge`] otherwise.
    async fn create_edge(&self, edge: StoredEdge, exist_ok: bool) -> StorageResult<()>;

    /// Removes an edge. Returns whether it was present.
    async fn delete_edge(&self, edge: &StoredEdge) -> StorageResult<bool>;

    /// Removes every edge matching any of `filters`. Returns the number removed.
    async fn delete_matching(&self, filters: &[EdgeFilter]) -> StorageResult<usize>;

    /// Applies all operations or none of them.
    async fn write_batch(&self, operations: Vec<WriteOperation>) -> StorageResult<()>;

    /// Removes all edges.
    async fn clear_all(&self) -> StorageResult<()>;

    /// Reads edges matching the filter, in insertion order.
    async fn read_edges(&self, filter: &EdgeFilter) -> StorageResult<Vec<StoredEdge>>;

    /// Reads one page of edges matching the filter, in insertion order.
    async fn read_edges_paginated(
        &self,
        filter: &EdgeFilter,
        pagination: &PaginationOptions,
    ) -> StorageResult<PaginatedResult<StoredEdge>>;

    /// Distinct namespaces on either side of any edge, sorted.
    async fn list_namespaces(&self) -> StorageResult<Vec<String>>;

    /// A consistent point-in-time view for traversals.
    async fn snapshot(&self) -> StorageResult<Arc<EdgeIndex>>;

    async fn health_check(&self) -> StorageResult<HealthStatus>;
}

/// Basic structural checks every backend applies before writing.
pub fn validate_edge(edge: &StoredEdge) -> StorageResult<()> {
    let required = [
        ("object_namespace", &edge.object_namespace),
        ("object_name", &edge.object_name),
        ("relation", &edge.relation),
        ("subject_namespace", &edge.subject_namespace),
        ("subject_name", &edge.subject_name),
    ];
    for (field, value) in required {
        if value.is_empty() {
            return Err(StorageError::InvalidInput {
                message: format!("{field} cannot be empty"),
            });
        }
    }
    if edge.subject_relation.as_deref() == Some("") {
        return Err(StorageError::InvalidInput {
            message: "subject_relation cannot be empty when present".to_string(),
        });
    }
    Ok(())
}

/// Resolves the effective page size, clamped to [`MAX_PAGE_SIZE`].
pub fn effective_page_size(pagination: &PaginationOptions) -> StorageResult<usize> {
    match pagination.page_size {
        Some(0) => Err(StorageError::InvalidInput {
            message: "page_size must be greater than zero".to_string(),
        }),
        Some(size) => Ok(size.min(MAX_PAGE_SIZE) as usize),
        None => Ok(DEFAULT_PAGE_SIZE as usize),
    }
}

/// Decodes a continuation token into the sequence number to resume after.
pub fn parse_continuation_token(token: Option<&str>) -> StorageResult<Option<u64>> {
    match token {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| StorageError::InvalidContinuationToken {
                token: raw.to_string(),
            }),
    }
}
