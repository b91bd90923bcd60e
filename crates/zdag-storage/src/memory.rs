//! In-memory storage implementation.
//!
//! The whole graph lives in one [`EdgeIndex`] behind `RwLock<Arc<_>>`.
//! Writers take the exclusive lock and mutate through `Arc::make_mut`, which
//! clones the index only while a reader still holds an older snapshot.
//! Readers take the shared lock just long enough to clone the `Arc`, so a
//! long traversal never blocks writers and never sees a half-applied write.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::error::{HealthStatus, StorageError, StorageResult};
use crate::index::EdgeIndex;
use crate::traits::{
    effective_page_size, parse_continuation_token, validate_edge, EdgeFilter, EdgeStore,
    PaginatedResult, PaginationOptions, StoredEdge, WriteOperation,
};

/// In-memory implementation of [`EdgeStore`].
///
/// # Performance Characteristics
///
/// - **Create / delete edge**: O(log N) amortised, plus one O(N) index clone
///   when a snapshot taken before the write is still alive
/// - **Snapshot**: O(1)
/// - **Read edges**: O(N) scan in insertion order
#[derive(Debug, Default)]
pub struct MemoryEdgeStore {
    index: RwLock<Arc<EdgeIndex>>,
}

impl MemoryEdgeStore {
    /// Creates a new, empty in-memory edge store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory edge store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn current(&self) -> Arc<EdgeIndex> {
        Arc::clone(&self.index.read())
    }
}

/// Dry-runs a batch against `index` so that a failing operation is detected
/// before anything is written.
fn stage_batch(index: &EdgeIndex, operations: &[WriteOperation]) -> StorageResult<()> {
    let mut added: HashSet<&StoredEdge> = HashSet::new();
    let mut removed: HashSet<&StoredEdge> = HashSet::new();

    for operation in operations {
        match operation {
            WriteOperation::Create { edge, exist_ok } => {
                validate_edge(edge)?;
                let present =
                    added.contains(edge) || (index.contains(edge) && !removed.contains(edge));
                if present && !exist_ok {
                    return Err(StorageError::DuplicateEdge {
                        edge: edge.to_string(),
                    });
                }
                removed.remove(edge);
                added.insert(edge);
            }
            WriteOperation::Delete { edge } => {
                added.remove(edge);
                removed.insert(edge);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl EdgeStore for MemoryEdgeStore {
    #[instrument(skip(self, edge), fields(edge = %edge))]
    async fn create_edge(&self, edge: StoredEdge, exist_ok: bool) -> StorageResult<()> {
        validate_edge(&edge)?;

        let mut guard = self.index.write();
        if guard.contains(&edge) {
            if exist_ok {
                return Ok(());
            }
            return Err(StorageError::DuplicateEdge {
                edge: edge.to_string(),
            });
        }
        Arc::make_mut(&mut *guard).insert(edge);
        Ok(())
    }

    #[instrument(skip(self, edge), fields(edge = %edge))]
    async fn delete_edge(&self, edge: &StoredEdge) -> StorageResult<bool> {
        let mut guard = self.index.write();
        if !guard.contains(edge) {
            return Ok(false);
        }
        Ok(Arc::make_mut(&mut *guard).remove(edge))
    }

    async fn delete_matching(&self, filters: &[EdgeFilter]) -> StorageResult<usize> {
        if filters.is_empty() {
            return Err(StorageError::InvalidFilter {
                message: "at least one filter is required".to_string(),
            });
        }
        if filters.iter().any(EdgeFilter::is_empty) {
            return Err(StorageError::InvalidFilter {
                message: "filters must constrain at least one field".to_string(),
            });
        }

        let mut guard = self.index.write();
        let doomed: Vec<StoredEdge> = guard
            .iter()
            .filter(|edge| filters.iter().any(|filter| filter.matches(edge)))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        let index = Arc::make_mut(&mut *guard);
        for edge in &doomed {
            index.remove(edge);
        }
        debug!(deleted = doomed.len(), "deleted edges matching filters");
        Ok(doomed.len())
    }

    #[instrument(skip(self, operations), fields(count = operations.len()))]
    async fn write_batch(&self, operations: Vec<WriteOperation>) -> StorageResult<()> {
        let mut guard = self.index.write();
        stage_batch(&guard, &operations)?;

        let index = Arc::make_mut(&mut *guard);
        for operation in operations {
            match operation {
                WriteOperation::Create { edge, .. } => {
                    index.insert(edge);
                }
                WriteOperation::Delete { edge } => {
                    index.remove(&edge);
                }
            }
        }
        Ok(())
    }

    async fn clear_all(&self) -> StorageResult<()> {
        let mut guard = self.index.write();
        let removed = guard.len();
        Arc::make_mut(&mut *guard).clear();
        debug!(removed, "cleared all edges");
        Ok(())
    }

    async fn read_edges(&self, filter: &EdgeFilter) -> StorageResult<Vec<StoredEdge>> {
        let index = self.current();
        Ok(index
            .iter()
            .filter(|edge| filter.matches(edge))
            .cloned()
            .collect())
    }

    async fn read_edges_paginated(
        &self,
        filter: &EdgeFilter,
        pagination: &PaginationOptions,
    ) -> StorageResult<PaginatedResult<StoredEdge>> {
        let page_size = effective_page_size(pagination)?;
        let after = parse_continuation_token(pagination.continuation_token.as_deref())?;

        let index = self.current();
        let mut matching = index
            .iter_after(after)
            .filter(|(_, edge)| filter.matches(edge));

        let mut items = Vec::with_capacity(page_size);
        let mut last_seq = None;
        for (seq, edge) in matching.by_ref().take(page_size) {
            items.push(edge.clone());
            last_seq = Some(seq);
        }

        let continuation_token = match (matching.next(), last_seq) {
            (Some(_), Some(seq)) => Some(seq.to_string()),
            _ => None,
        };
        Ok(PaginatedResult {
            items,
            continuation_token,
        })
    }

    async fn list_namespaces(&self) -> StorageResult<Vec<String>> {
        Ok(self.current().namespaces())
    }

    async fn snapshot(&self) -> StorageResult<Arc<EdgeIndex>> {
        Ok(self.current())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let start = Instant::now();
        let edge_count = self.current().len();
        Ok(HealthStatus {
            healthy: true,
            latency: start.elapsed(),
            edge_count,
            message: Some("in-memory storage".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(obj_name: &str, sbj_name: &str) -> StoredEdge {
        StoredEdge::new("doc", obj_name, "viewer", "user", sbj_name, None)
    }

    // Test: MemoryEdgeStore can be created
    #[tokio::test]
    async fn test_memory_store_can_be_created() {
        let store = MemoryEdgeStore::new();
        let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
        assert!(edges.is_empty());
    }

    // Test: MemoryEdgeStore can be created as shared Arc
    #[tokio::test]
    async fn test_memory_store_shared() {
        let store = MemoryEdgeStore::new_shared();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        let store2 = Arc::clone(&store);
        let edges = store2.read_edges(&EdgeFilter::default()).await.unwrap();
        assert_eq!(edges, vec![edge("1", "alice")]);
    }

    #[tokio::test]
    async fn test_create_duplicate_respects_exist_ok() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        store.create_edge(edge("1", "alice"), true).await.unwrap();
        let err = store
            .create_edge(edge("1", "alice"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEdge { .. }));

        let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_edge() {
        let store = MemoryEdgeStore::new();
        let result = store.create_edge(edge("", "alice"), true).await;
        assert!(matches!(result, Err(StorageError::InvalidInput { .. })));
    }

    // Test: deleting an absent edge is not an error
    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        assert!(store.delete_edge(&edge("1", "alice")).await.unwrap());
        assert!(!store.delete_edge(&edge("1", "alice")).await.unwrap());
        assert!(store
            .read_edges(&EdgeFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_read_edges_filters_in_insertion_order() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("2", "alice"), false).await.unwrap();
        store.create_edge(edge("1", "bob"), false).await.unwrap();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        let filter = EdgeFilter {
            subject_name: Some("alice".to_string()),
            ..Default::default()
        };
        let edges = store.read_edges(&filter).await.unwrap();
        assert_eq!(edges, vec![edge("2", "alice"), edge("1", "alice")]);
    }

    #[tokio::test]
    async fn test_pagination_walks_all_pages() {
        let store = MemoryEdgeStore::new();
        for i in 0..7 {
            store
                .create_edge(edge(&i.to_string(), "alice"), false)
                .await
                .unwrap();
        }

        let mut token = None;
        let mut seen = Vec::new();
        loop {
            let page = store
                .read_edges_paginated(
                    &EdgeFilter::default(),
                    &PaginationOptions {
                        page_size: Some(3),
                        continuation_token: token.clone(),
                    },
                )
                .await
                .unwrap();
            assert!(page.items.len() <= 3);
            seen.extend(page.items.into_iter().map(|e| e.object_name));
            token = page.continuation_token;
            if token.is_none() {
                break;
            }
        }
        assert_eq!(seen, vec!["0", "1", "2", "3", "4", "5", "6"]);
    }

    #[tokio::test]
    async fn test_pagination_exact_fit_has_no_token() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();
        store.create_edge(edge("2", "alice"), false).await.unwrap();

        let page = store
            .read_edges_paginated(
                &EdgeFilter::default(),
                &PaginationOptions {
                    page_size: Some(2),
                    continuation_token: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_batch_is_atomic_on_duplicate() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        let result = store
            .write_batch(vec![
                WriteOperation::Create {
                    edge: edge("2", "alice"),
                    exist_ok: false,
                },
                WriteOperation::Delete {
                    edge: edge("1", "alice"),
                },
                WriteOperation::Create {
                    edge: edge("2", "alice"),
                    exist_ok: false,
                },
            ])
            .await;
        assert!(matches!(result, Err(StorageError::DuplicateEdge { .. })));

        let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
        assert_eq!(edges, vec![edge("1", "alice")]);
    }

    #[tokio::test]
    async fn test_batch_delete_then_recreate() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        store
            .write_batch(vec![
                WriteOperation::Delete {
                    edge: edge("1", "alice"),
                },
                WriteOperation::Create {
                    edge: edge("1", "alice"),
                    exist_ok: false,
                },
                WriteOperation::Create {
                    edge: edge("2", "bob"),
                    exist_ok: true,
                },
            ])
            .await
            .unwrap();

        let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
        assert_eq!(edges, vec![edge("1", "alice"), edge("2", "bob")]);
    }

    #[tokio::test]
    async fn test_delete_matching_any_filter() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();
        store.create_edge(edge("2", "bob"), false).await.unwrap();
        store.create_edge(edge("3", "carol"), false).await.unwrap();

        let deleted = store
            .delete_matching(&[
                EdgeFilter {
                    subject_name: Some("alice".to_string()),
                    ..Default::default()
                },
                EdgeFilter {
                    object_name: Some("3".to_string()),
                    ..Default::default()
                },
            ])
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
        assert_eq!(edges, vec![edge("2", "bob")]);
    }

    #[tokio::test]
    async fn test_delete_matching_rejects_unbounded_filters() {
        let store = MemoryEdgeStore::new();
        assert!(matches!(
            store.delete_matching(&[]).await,
            Err(StorageError::InvalidFilter { .. })
        ));
        assert!(matches!(
            store.delete_matching(&[EdgeFilter::default()]).await,
            Err(StorageError::InvalidFilter { .. })
        ));
    }

    // Test: a snapshot is unaffected by writes made after it was taken
    #[tokio::test]
    async fn test_snapshot_is_point_in_time() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        store.create_edge(edge("2", "alice"), false).await.unwrap();
        store.clear_all().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(&edge("1", "alice")));
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_then_list_namespaces_is_empty() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();
        assert_eq!(
            store.list_namespaces().await.unwrap(),
            vec!["doc".to_string(), "user".to_string()]
        );

        store.clear_all().await.unwrap();
        assert!(store.list_namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_check_reports_edge_count() {
        let store = MemoryEdgeStore::new();
        store.create_edge(edge("1", "alice"), false).await.unwrap();
        let health = store.health_check().await.unwrap();
        assert!(health.healthy);
        assert_eq!(health.edge_count, 1);
    }
}
