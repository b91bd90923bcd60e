//! Shared helpers for zdag API integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use zdag_api::http::{create_router, AppState};
use zdag_server::config::EngineSettings;
use zdag_storage::MemoryEdgeStore;

/// Number of concurrent clients for concurrency tests.
pub const CONCURRENT_CLIENT_COUNT: usize = 50;

/// Creates a test app over `storage`.
///
/// Each call builds a fresh `AppState`; apps built over the same storage
/// observe each other's writes.
pub fn create_test_app(storage: &Arc<MemoryEdgeStore>) -> Router {
    create_router(AppState::new(Arc::clone(storage)))
}

/// Creates a test app with engine limits applied.
pub fn create_test_app_with_engine(
    storage: &Arc<MemoryEdgeStore>,
    engine: &EngineSettings,
) -> Router {
    create_router(AppState::with_engine_settings(Arc::clone(storage), engine))
}

/// Parses `namespace:name` or `namespace:name#relation` into a JSON entity.
pub fn entity(value: &str) -> Value {
    let (entity, relation) = match value.split_once('#') {
        Some((entity, relation)) => (entity, Some(relation)),
        None => (value, None),
    };
    let (namespace, name) = entity.split_once(':').unwrap();
    match relation {
        Some(relation) => json!({"namespace": namespace, "name": name, "relation": relation}),
        None => json!({"namespace": namespace, "name": name}),
    }
}

/// Nested edge body for `object <- subject`.
pub fn edge(object: &str, subject: &str) -> Value {
    json!({"object": entity(object), "subject": entity(subject)})
}

/// Sends a request and returns status plus parsed JSON (`null` when empty).
pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            json!({ "raw_body": String::from_utf8_lossy(&bytes).to_string() })
        })
    };
    (status, json)
}

/// POSTs a JSON body.
pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

/// GETs a URI.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

/// Creates every `(object, subject)` edge, asserting success.
pub async fn seed(app: &Router, edges: &[(&str, &str)]) {
    for (object, subject) in edges {
        let (status, body) = post_json(app.clone(), "/relation", edge(object, subject)).await;
        assert_eq!(status, StatusCode::OK, "seeding {object} <- {subject}: {body}");
    }
}

/// Renders a JSON entity back to `namespace:name[#relation]`.
pub fn entity_str(value: &Value) -> String {
    let mut out = format!(
        "{}:{}",
        value["namespace"].as_str().unwrap(),
        value["name"].as_str().unwrap()
    );
    if let Some(relation) = value["relation"].as_str() {
        out.push('#');
        out.push_str(relation);
    }
    out
}

/// Renders a JSON array of entities.
pub fn entity_list(value: &Value) -> Vec<String> {
    value.as_array().unwrap().iter().map(entity_str).collect()
}
