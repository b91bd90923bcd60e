//! HTTP middleware.
//!
//! Includes:
//! - Request ID generation and propagation
//! - Per-request tracing spans
//! - CORS configuration

mod request_id;
mod tracing_layer;

pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
pub use tracing_layer::TracingLayer;

use tower_http::cors::{Any, CorsLayer};

/// Creates a permissive CORS layer: any origin, method and header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

#[cfg(test)]
mod tests;
