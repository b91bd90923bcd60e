//! zdag-server: configuration and mutation handlers
//!
//! This crate sits between the HTTP layer and storage:
//! - Configuration loading (defaults, YAML file, `ZDAG_` environment)
//! - Validated relation writes with an optional cycle guard
//! - Atomic batch operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                zdag-server                  │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  handlers/   - Mutation handlers            │
//! │    write.rs  - Create, delete, clear        │
//! │    batch/    - Atomic batch operations      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod handlers;

pub use config::{ConfigLoadError, ServerConfig};
