//! Relation graph model types.
//!
//! This module contains:
//! - Entity references, edges and batch operations
//! - Expansion tree nodes
//! - Search/collect conditions and entity patterns

mod condition;
mod types;

pub use condition::{CollectCondition, Compare, EntityPattern, SearchCondition};
pub use types::*;
