//! Middleware stack tests.

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::ServiceExt;

use super::*;

/// Router with the production layer order: request id outermost, so the
/// tracing span can read it.
fn test_app() -> Router {
    Router::new()
        .route(
            "/",
            get(|Extension(id): Extension<RequestId>| async move { id.0 }),
        )
        .route(
            "/error",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .layer(TracingLayer::new())
        .layer(RequestIdLayer::new())
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(REQUEST_ID_HEADER)
        .expect("response should carry x-request-id")
        .to_str()
        .unwrap()
        .to_string()
}

// Test: a missing id is generated, echoed and visible to the handler
#[tokio::test]
async fn test_request_id_is_generated() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let id = header(&response);
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(body_text(response).await, id);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "custom-request-id-12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(header(&response), "custom-request-id-12345");
    assert_eq!(body_text(response).await, "custom-request-id-12345");
}

// Test: ids with whitespace are replaced rather than echoed
#[tokio::test]
async fn test_unacceptable_request_id_is_replaced() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "two words")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let id = header(&response);
    assert_ne!(id, "two words");
    assert!(uuid::Uuid::parse_str(&id).is_ok());
}

#[tokio::test]
async fn test_tracing_layer_passes_errors_through() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/error")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_cors_headers_are_set() {
    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .layer(cors_layer());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/")
                .header("Origin", "http://example.com")
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
