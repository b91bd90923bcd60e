//! HTTP route definitions and handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};
use tracing::error;

use zdag_domain::model::{Direction, EntityRef, TreeNode};
use zdag_domain::resolver::{AuthLookupRequest, CheckRequest, RelationsRequest, TreeRequest};
use zdag_server::config::ServerSettings;
use zdag_server::handlers::batch::BatchOperationRequest;
use zdag_storage::EdgeStore;

use super::error::{ApiError, ApiResult, JsonBadRequest};
use super::state::AppState;
use super::types::{
    CheckResponse, CreateEdgeBody, DataResponse, DeleteByQueriesBody, DeleteEdgeBody,
    DeletedResponse, EdgePageResponse, ForestResponse, ListEdgesQuery, ObjectAuthsBody,
    ObjectRelationsBody, PathQueryBody, SubjectAuthsBody, SubjectRelationsBody, TreeBody,
};
use crate::adapters::{from_stored, to_storage_filter};
use crate::middleware::{cors_layer, RequestIdLayer, TracingLayer};

/// Default request body size limit (1MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

fn api_routes<S: EdgeStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Edge storage
        .route(
            "/relation",
            get(list_edges::<S>)
                .post(create_edge::<S>)
                .delete(delete_edge::<S>),
        )
        .route(
            "/relation/all",
            post(clear_all::<S>).delete(clear_all::<S>),
        )
        .route(
            "/relation/clear-all-relations",
            post(clear_all::<S>).delete(clear_all::<S>),
        )
        .route("/relation/get-all-namespaces", get(list_namespaces::<S>))
        .route("/relation/delete-by-queries", post(delete_by_queries::<S>))
        .route("/relation/batch-operation", post(batch_operation::<S>))
        // Queries
        .route("/relation/check", post(check::<S>))
        .route("/relation/get-shortest-path", post(shortest_path::<S>))
        .route("/relation/get-all-paths", post(all_paths::<S>))
        .route(
            "/relation/get-all-object-relations",
            post(object_relations::<S>),
        )
        .route(
            "/relation/get-all-subject-relations",
            post(subject_relations::<S>),
        )
        .route("/relation/obj-auths", post(objects_with_auth::<S>))
        .route("/relation/sbj-who-has-auth", post(subjects_with_auth::<S>))
        .route("/relation/get-tree", post(get_tree::<S>))
        .route("/relation/see-tree", post(see_tree::<S>))
        // Liveness and health
        .route("/ping", get(ping))
        .route("/healthy", get(health_check::<S>))
}

/// Creates the HTTP router with the default body size limit.
pub fn create_router<S: EdgeStore>(state: AppState<S>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the HTTP router with a custom body size limit.
pub fn create_router_with_body_limit<S: EdgeStore>(
    state: AppState<S>,
    body_limit: usize,
) -> Router {
    api_routes::<S>()
        .with_state(Arc::new(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
}

/// Creates the full application: routes plus the middleware stack described
/// by `settings`.
///
/// Layers run outermost first: request id, tracing span, CORS, timeout, body
/// limit.
pub fn create_app<S: EdgeStore>(state: AppState<S>, settings: &ServerSettings) -> Router {
    let mut app = create_router_with_body_limit(state, settings.max_body_bytes);
    if let Some(timeout) = settings.request_timeout() {
        app = app.layer(TimeoutLayer::new(timeout));
    }
    if settings.cors_enabled {
        app = app.layer(cors_layer());
    }
    app.layer(TracingLayer::new()).layer(RequestIdLayer::new())
}

// ============================================================
// Health
// ============================================================

async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// Reports backend health. Error details are logged, not returned.
async fn health_check<S: EdgeStore>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(status) if status.healthy => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "edges": status.edge_count,
            })),
        ),
        Ok(status) => {
            error!(message = ?status.message, "storage reported unhealthy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
        Err(err) => {
            error!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
    }
}

// ============================================================
// Edge storage
// ============================================================

async fn list_edges<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ListEdgesQuery>, QueryRejection>,
) -> ApiResult<Json<EdgePageResponse>> {
    let Query(query) =
        query.map_err(|rejection| ApiError::validation_error(rejection.body_text()))?;

    let filter = to_storage_filter(&query.filter());
    let page = state
        .storage
        .read_edges_paginated(&filter, &query.pagination())
        .await?;

    Ok(Json(EdgePageResponse {
        data: page.items.iter().map(from_stored).collect(),
        continuation_token: page.continuation_token,
    }))
}

async fn create_edge<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<CreateEdgeBody>,
) -> ApiResult<impl IntoResponse> {
    let edge = body.edge.into_edge();
    state.writer.create(&edge, body.exist_ok).await?;
    Ok(Json(json!({})))
}

async fn delete_edge<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<DeleteEdgeBody>,
) -> ApiResult<impl IntoResponse> {
    let edge = body.edge.into_edge();
    state.writer.delete(&edge).await?;
    Ok(Json(json!({})))
}

async fn clear_all<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<impl IntoResponse> {
    state.writer.clear_all().await?;
    Ok(Json(json!({})))
}

async fn list_namespaces<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<DataResponse<Vec<String>>>> {
    let namespaces = state.storage.list_namespaces().await?;
    Ok(Json(DataResponse { data: namespaces }))
}

async fn delete_by_queries<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<DeleteByQueriesBody>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.writer.delete_by_queries(&body.queries).await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn batch_operation<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<BatchOperationRequest>,
) -> ApiResult<impl IntoResponse> {
    state.batch_handler.apply(body).await?;
    Ok(Json(json!({})))
}

// ============================================================
// Queries
// ============================================================

fn check_request(body: PathQueryBody) -> CheckRequest {
    let options = body.options();
    let mut request =
        CheckRequest::new(body.subject, body.object).with_search(body.search_condition);
    request.options = options;
    request
}

async fn check<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<PathQueryBody>,
) -> ApiResult<Json<CheckResponse>> {
    let result = state.resolver.check(&check_request(body)).await?;
    Ok(Json(CheckResponse {
        allowed: result.allowed,
    }))
}

async fn shortest_path<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<PathQueryBody>,
) -> ApiResult<impl IntoResponse> {
    let path = state.resolver.shortest_path(&check_request(body)).await?;
    Ok(Json(DataResponse { data: path }))
}

async fn all_paths<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<PathQueryBody>,
) -> ApiResult<impl IntoResponse> {
    let paths = state.resolver.all_paths(&check_request(body)).await?;
    Ok(Json(DataResponse { data: paths }))
}

async fn object_relations<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<ObjectRelationsBody>,
) -> ApiResult<Json<DataResponse<Vec<EntityRef>>>> {
    let options = body.options();
    let request = RelationsRequest {
        max_depth: body.max_depth,
        search: body.search_condition,
        collect: body.collect_condition,
        options,
        ..RelationsRequest::new(body.subject, Direction::Forward)
    };
    let objects = state.resolver.related(&request).await?;
    Ok(Json(DataResponse { data: objects }))
}

async fn subject_relations<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<SubjectRelationsBody>,
) -> ApiResult<Json<DataResponse<Vec<EntityRef>>>> {
    let options = body.options();
    let request = RelationsRequest {
        max_depth: body.max_depth,
        search: body.search_condition,
        collect: body.collect_condition,
        options,
        ..RelationsRequest::new(body.object, Direction::Reverse)
    };
    let subjects = state.resolver.related(&request).await?;
    Ok(Json(DataResponse { data: subjects }))
}

async fn objects_with_auth<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<ObjectAuthsBody>,
) -> ApiResult<Json<DataResponse<Vec<EntityRef>>>> {
    let request = AuthLookupRequest::new(body.subject, body.object);
    let objects = state.resolver.objects_with_auth(&request).await?;
    Ok(Json(DataResponse { data: objects }))
}

async fn subjects_with_auth<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<SubjectAuthsBody>,
) -> ApiResult<Json<DataResponse<Vec<EntityRef>>>> {
    let request = AuthLookupRequest::new(body.object, body.subject);
    let subjects = state.resolver.subjects_with_auth(&request).await?;
    Ok(Json(DataResponse { data: subjects }))
}

/// The tree request named by `body`, or `None` when it has no root.
fn tree_request(body: &TreeBody) -> ApiResult<Option<TreeRequest>> {
    let (root, direction) = match (&body.subject, &body.object) {
        (Some(_), Some(_)) => {
            return Err(ApiError::validation_error(
                "a tree is rooted at either a subject or an object, not both",
            ))
        }
        (Some(subject), None) => (subject.clone(), Direction::Forward),
        (None, Some(object)) => (object.clone(), Direction::Reverse),
        (None, None) => return Ok(None),
    };
    Ok(Some(TreeRequest {
        max_depth: body.max_depth,
        options: body.options(),
        ..TreeRequest::new(root, direction)
    }))
}

async fn get_tree<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(body): JsonBadRequest<TreeBody>,
) -> ApiResult<Json<DataResponse<TreeNode>>> {
    let request = tree_request(&body)?
        .ok_or_else(|| ApiError::validation_error("subject or object is required"))?;
    let tree = state.resolver.build_tree(&request).await?;
    Ok(Json(DataResponse { data: tree }))
}

/// Like `get-tree`, but an empty body renders the whole graph as a forest.
async fn see_tree<S: EdgeStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> ApiResult<Json<ForestResponse>> {
    let body: TreeBody = if body.iter().all(u8::is_ascii_whitespace) {
        TreeBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| ApiError::validation_error(err.to_string()))?
    };

    let trees = match tree_request(&body)? {
        Some(request) => vec![state.resolver.build_tree(&request).await?],
        None => {
            state
                .resolver
                .forest(body.max_depth, &body.options())
                .await?
        }
    };
    let rendered = trees.iter().map(TreeNode::render).collect();
    Ok(Json(ForestResponse {
        data: trees,
        rendered,
    }))
}
