//! Storage Integration Tests.
//!
//! These tests exercise `MemoryEdgeStore` through the `EdgeStore` trait only,
//! including concurrent readers and writers sharing one store.

use std::sync::Arc;

use zdag_storage::{EdgeFilter, EdgeStore, MemoryEdgeStore, NodeKey, StoredEdge, WriteOperation};

fn member(group: &str, user: &str) -> StoredEdge {
    StoredEdge::new("group", group, "member", "user", user, None)
}

/// Helper function to run a test against any EdgeStore implementation.
async fn run_basic_crud_test<S: EdgeStore>(store: &S) {
    let edge = StoredEdge::new("a", "1", "read", "f", "1", Some("write".to_string()));
    store.create_edge(edge.clone(), false).await.unwrap();

    let filter = EdgeFilter {
        object_namespace: Some("a".to_string()),
        object_name: Some("1".to_string()),
        relation: Some("read".to_string()),
        subject_namespace: Some("f".to_string()),
        subject_name: Some("1".to_string()),
        ..Default::default()
    };
    let edges = store.read_edges(&filter).await.unwrap();
    assert_eq!(edges, vec![edge.clone()]);

    assert!(store.delete_edge(&edge).await.unwrap());
    assert!(store.read_edges(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_store_basic_crud() {
    let store = MemoryEdgeStore::new();
    run_basic_crud_test(&store).await;
}

#[tokio::test]
async fn test_memory_store_trait_object() {
    let store: Arc<dyn EdgeStore> = Arc::new(MemoryEdgeStore::new());
    store.create_edge(member("eng", "alice"), false).await.unwrap();
    let snapshot = store.snapshot().await.unwrap();
    let objects: Vec<NodeKey> = snapshot
        .edges_from(&NodeKey::new("user", "alice", None))
        .map(StoredEdge::object_node)
        .collect();
    assert_eq!(
        objects,
        vec![NodeKey::new("group", "eng", Some("member".to_string()))]
    );
}

// Test: snapshots never observe an edge in only one of the two indices
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_and_snapshots_stay_consistent() {
    let store = MemoryEdgeStore::new_shared();

    let mut writers = Vec::new();
    for w in 0..4 {
        let store = Arc::clone(&store);
        writers.push(tokio::spawn(async move {
            for i in 0..100 {
                let edge = member(&format!("g{w}"), &format!("u{i}"));
                store.create_edge(edge.clone(), false).await.unwrap();
                if i % 3 == 0 {
                    store.delete_edge(&edge).await.unwrap();
                }
            }
        }));
    }

    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..200 {
                let snapshot = store.snapshot().await.unwrap();
                for edge in snapshot.iter() {
                    let forward: Vec<_> = snapshot.edges_to(&edge.object_node()).collect();
                    let reverse: Vec<_> = snapshot.edges_from(&edge.subject_node()).collect();
                    assert!(forward.contains(&edge));
                    assert!(reverse.contains(&edge));
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    // 100 inserts per writer, every third one deleted again
    let edges = store.read_edges(&EdgeFilter::default()).await.unwrap();
    assert_eq!(edges.len(), 4 * 66);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_creates_insert_once() {
    let store = MemoryEdgeStore::new_shared();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create_edge(member("eng", "alice"), false).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(
        store.read_edges(&EdgeFilter::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_batch_failure_leaves_store_untouched() {
    let store = MemoryEdgeStore::new();
    store.create_edge(member("eng", "alice"), false).await.unwrap();
    let before = store.snapshot().await.unwrap();

    let result = store
        .write_batch(vec![
            WriteOperation::Delete {
                edge: member("eng", "alice"),
            },
            WriteOperation::Create {
                edge: member("eng", "bob"),
                exist_ok: false,
            },
            WriteOperation::Create {
                edge: StoredEdge::new("group", "", "member", "user", "eve", None),
                exist_ok: true,
            },
        ])
        .await;
    assert!(result.is_err());

    let after = store.read_edges(&EdgeFilter::default()).await.unwrap();
    let before: Vec<_> = before.iter().cloned().collect();
    assert_eq!(after, before);
}
