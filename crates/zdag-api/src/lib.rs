//! zdag-api: HTTP layer and service binary for the zdag relation graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  zdag-api                   │
//! ├─────────────────────────────────────────────┤
//! │  http/          - REST endpoints (axum)     │
//! │  adapters       - storage <-> domain traits │
//! │  middleware/    - request id, tracing, CORS │
//! │  observability/ - logging setup             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod http;
pub mod middleware;
pub mod observability;
