//! Graph resolver for checks, path queries, closures and trees.
//!
//! The resolver answers every read query against one immutable snapshot of
//! the relation graph.
//!
//! # Architecture Decisions
//!
//! - **Userset expansion**: a subject reference with a relation is a node of
//!   its own. Reaching it and following its outgoing edges is the expansion
//!   step, so no special casing or dynamic dispatch is needed.
//!
//! - **Cycle safety**: every traversal is iterative and carries a visited
//!   set (global for BFS, per-branch for path enumeration and trees).
//!
//! - **Determinism**: adjacency is in insertion order, so BFS ties and DFS
//!   enumeration order are stable for an unchanged graph.
//!
//! - **Bounded work**: path enumeration is capped (`max_paths`,
//!   `max_path_length`), trees are capped (`max_tree_depth`,
//!   `max_tree_nodes`), and every query has a timeout. Hitting a cap is an
//!   error, never a silently truncated answer.

mod config;
mod context;
mod graph_resolver;
mod overlay;
mod traits;
mod traversal;
mod types;

#[cfg(test)]
mod tests;

pub use config::{
    ResolverConfig, DEFAULT_MAX_PATHS, DEFAULT_MAX_PATH_LENGTH, DEFAULT_MAX_TREE_DEPTH,
    DEFAULT_MAX_TREE_NODES,
};
pub use context::CancelToken;
pub use graph_resolver::GraphResolver;
pub use overlay::OverlaySnapshot;
pub use traits::{EdgeReader, EdgeWriter, GraphSnapshot};
pub use types::{
    AuthLookupRequest, CheckRequest, CheckResult, CycleReport, PathRequest, QueryOptions,
    RelationsRequest, TreeRequest,
};
