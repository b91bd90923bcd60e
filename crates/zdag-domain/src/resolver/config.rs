//! Configuration for the graph resolver.

use std::time::Duration;

/// Default cap on the number of paths one `all_paths` query may return.
pub const DEFAULT_MAX_PATHS: usize = 10_000;

/// Default cap on the number of edges in one enumerated path.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 256;

/// Default depth limit for expansion trees.
pub const DEFAULT_MAX_TREE_DEPTH: u32 = 32;

/// Default node limit for expansion trees.
pub const DEFAULT_MAX_TREE_NODES: usize = 10_000;

/// Configuration for the graph resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout for a single query, unless the request overrides it.
    pub timeout: Duration,
    /// Maximum hop count for `check`. `None` searches the whole reachable set.
    pub max_check_depth: Option<u32>,
    /// Maximum number of paths returned by `all_paths`.
    pub max_paths: usize,
    /// Maximum number of edges in a path explored by `all_paths`.
    pub max_path_length: usize,
    /// Maximum tree depth; requests may ask for less, never more.
    pub max_tree_depth: u32,
    /// Maximum number of nodes in one tree or forest.
    pub max_tree_nodes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_check_depth: None,
            max_paths: DEFAULT_MAX_PATHS,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            max_tree_nodes: DEFAULT_MAX_TREE_NODES,
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates a new configuration with a hop limit for `check`.
    pub fn with_max_check_depth(mut self, max_depth: u32) -> Self {
        self.max_check_depth = Some(max_depth);
        self
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_max_tree_depth(mut self, max_tree_depth: u32) -> Self {
        self.max_tree_depth = max_tree_depth;
        self
    }

    pub fn with_max_tree_nodes(mut self, max_tree_nodes: usize) -> Self {
        self.max_tree_nodes = max_tree_nodes;
        self
    }
}
