//! Tests for the batch operation handler.

use std::sync::Arc;

use super::*;
use crate::handlers::test_support::{edge, MemoryGraph};
use crate::handlers::write::RelationWriter;
use zdag_domain::error::DomainError;
use zdag_domain::model::Operation;
use zdag_domain::resolver::GraphResolver;

fn handler(graph: &Arc<MemoryGraph>) -> BatchOperationHandler<MemoryGraph, MemoryGraph> {
    handler_with_guard(graph, false)
}

fn handler_with_guard(
    graph: &Arc<MemoryGraph>,
    deny_cycles: bool,
) -> BatchOperationHandler<MemoryGraph, MemoryGraph> {
    let resolver = Arc::new(GraphResolver::new(Arc::clone(graph)));
    let writer =
        RelationWriter::new(Arc::clone(graph), resolver).with_cycle_guard(deny_cycles);
    BatchOperationHandler::new(Arc::new(writer))
}

// ============================================================
// Section 1: Validation
// ============================================================

// Test: empty batch is rejected
#[tokio::test]
async fn test_empty_batch_rejected() {
    let graph = MemoryGraph::shared();
    let result = handler(&graph).apply(BatchOperationRequest::default()).await;
    assert!(matches!(result, Err(BatchOperationError::EmptyBatch)));
}

// Test: batch over the limit is rejected before anything is written
#[tokio::test]
async fn test_batch_size_limit() {
    let graph = MemoryGraph::shared();
    let handler = handler(&graph).with_max_batch_size(3);
    let operations = (0..4)
        .map(|i| Operation::create(edge(&format!("doc:{i}#viewer"), "user:alice")))
        .collect();

    let result = handler.apply(BatchOperationRequest::new(operations)).await;
    assert!(matches!(
        result,
        Err(BatchOperationError::BatchTooLarge { size: 4, max: 3 })
    ));
    assert!(graph.edges().is_empty());
}

#[test]
fn test_default_limit_applies() {
    let graph = MemoryGraph::shared();
    let operations = (0..=MAX_BATCH_SIZE)
        .map(|i| Operation::create(edge(&format!("doc:{i}#viewer"), "user:alice")))
        .collect();
    let result = handler(&graph).validate(&BatchOperationRequest::new(operations));
    assert!(matches!(
        result,
        Err(BatchOperationError::BatchTooLarge { .. })
    ));
}

// Test: the failing operation is reported by index
#[tokio::test]
async fn test_invalid_operation_reports_index() {
    let graph = MemoryGraph::shared();
    let mut bad = edge("doc:2#viewer", "user:bob");
    bad.subject.relation = Some(String::new());

    let request = BatchOperationRequest::new(vec![
        Operation::create(edge("doc:1#viewer", "user:alice")),
        Operation::create(bad),
    ]);
    let err = handler(&graph).apply(request).await.unwrap_err();
    match err {
        BatchOperationError::InvalidOperation { index, .. } => assert_eq!(index, 1),
        other => panic!("expected InvalidOperation, got {other:?}"),
    }
    assert!(graph.edges().is_empty());
}

// ============================================================
// Section 2: Atomic application
// ============================================================

#[tokio::test]
async fn test_operations_apply_in_order() {
    let graph = MemoryGraph::shared();
    let request = BatchOperationRequest::new(vec![
        Operation::create(edge("doc:1#viewer", "user:alice")),
        Operation::create(edge("doc:2#viewer", "user:alice")),
        Operation::delete(edge("doc:1#viewer", "user:alice")),
        Operation::create_if_not_exist(edge("doc:2#viewer", "user:alice")),
    ]);
    handler(&graph).apply(request).await.unwrap();
    assert_eq!(graph.edges(), vec![edge("doc:2#viewer", "user:alice")]);
}

// Test: a duplicate create aborts the whole batch
#[tokio::test]
async fn test_failed_operation_rolls_back_batch() {
    let graph = MemoryGraph::shared();
    let existing = edge("doc:1#viewer", "user:alice");
    handler(&graph)
        .apply(BatchOperationRequest::new(vec![Operation::create(
            existing.clone(),
        )]))
        .await
        .unwrap();

    let request = BatchOperationRequest::new(vec![
        Operation::create(edge("doc:2#viewer", "user:alice")),
        Operation::create(existing.clone()),
    ]);
    let err = handler(&graph).apply(request).await.unwrap_err();
    assert!(matches!(
        err,
        BatchOperationError::Domain(DomainError::AlreadyExists { .. })
    ));
    assert_eq!(graph.edges(), vec![existing]);
}

#[tokio::test]
async fn test_cycle_guard_applies_to_batches() {
    let graph = MemoryGraph::shared();
    let request = BatchOperationRequest::new(vec![
        Operation::create(edge("role:b#parent", "role:a#parent")),
        Operation::create(edge("role:a#parent", "role:b#parent")),
    ]);

    let err = handler_with_guard(&graph, true)
        .apply(request.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BatchOperationError::Domain(DomainError::CycleDetected { .. })
    ));
    assert!(graph.edges().is_empty());

    handler(&graph).apply(request).await.unwrap();
    assert_eq!(graph.edges().len(), 2);
}

#[test]
fn test_request_deserializes_wire_shape() {
    let request: BatchOperationRequest = serde_json::from_str(
        r#"{"operations": [{
            "type": "create_if_not_exist",
            "relation": {
                "object": {"namespace": "doc", "name": "1", "relation": "viewer"},
                "subject": {"namespace": "user", "name": "alice"}
            }
        }]}"#,
    )
    .unwrap();
    assert_eq!(
        request.operations,
        vec![Operation::create_if_not_exist(edge(
            "doc:1#viewer",
            "user:alice"
        ))]
    );
}
