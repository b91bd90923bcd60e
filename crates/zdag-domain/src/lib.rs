//! zdag-domain: Core relation graph logic
//!
//! This crate contains the relation graph engine including:
//! - Entity, edge and tree model types
//! - Edge and query argument validation
//! - Graph resolver for checks, paths, closures and trees
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                zdag-domain                  │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Entities, edges, conditions  │
//! │  validation/ - Naming rules                 │
//! │  resolver/   - Graph traversal engine       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod resolver;
pub mod validation;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
