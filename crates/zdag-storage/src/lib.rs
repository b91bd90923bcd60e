//! zdag-storage: Storage abstraction layer
//!
//! This crate provides the storage abstraction for zdag, including:
//! - EdgeStore trait for storage operations
//! - EdgeIndex, the forward/reverse adjacency index traversals run on
//! - In-memory implementation with copy-on-write snapshots
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               zdag-storage                  │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs - EdgeStore trait, stored types  │
//! │  index.rs  - forward/reverse adjacency      │
//! │  memory.rs - In-memory implementation       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod index;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{HealthStatus, StorageError, StorageResult};
pub use index::EdgeIndex;
pub use memory::MemoryEdgeStore;
pub use traits::{
    EdgeFilter, EdgeStore, NodeKey, PaginatedResult, PaginationOptions, StoredEdge,
    WriteOperation, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
