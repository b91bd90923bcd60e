//! Request and result types for the graph resolver.

use std::time::Duration;

use crate::model::{CollectCondition, Direction, Edge, EntityPattern, EntityRef, SearchCondition};

use super::context::CancelToken;

/// Per-request overrides for the resolver's budget.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Replaces the configured timeout for this request.
    pub timeout: Option<Duration>,
    /// Lets the caller abort the traversal.
    pub cancel: Option<CancelToken>,
}

/// Request for a check or a path query between two entities.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub subject: EntityRef,
    /// The target; its relation is required.
    pub object: EntityRef,
    pub search: SearchCondition,
    pub options: QueryOptions,
}

impl CheckRequest {
    pub fn new(subject: EntityRef, object: EntityRef) -> Self {
        Self {
            subject,
            object,
            search: SearchCondition::default(),
            options: QueryOptions::default(),
        }
    }

    pub fn with_search(mut self, search: SearchCondition) -> Self {
        self.search = search;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.options.cancel = Some(cancel);
        self
    }
}

/// Path queries take the same arguments as a check.
pub type PathRequest = CheckRequest;

/// Result of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub allowed: bool,
}

/// Request for the relation closure of one entity.
#[derive(Debug, Clone)]
pub struct RelationsRequest {
    pub root: EntityRef,
    /// `Forward` lists objects the root reaches, `Reverse` lists subjects
    /// that reach the root.
    pub direction: Direction,
    /// Hop limit. `None` or `Some(0)` enumerates the whole closure.
    pub max_depth: Option<u32>,
    pub search: SearchCondition,
    pub collect: CollectCondition,
    pub options: QueryOptions,
}

impl RelationsRequest {
    pub fn new(root: EntityRef, direction: Direction) -> Self {
        Self {
            root,
            direction,
            max_depth: None,
            search: SearchCondition::default(),
            collect: CollectCondition::default(),
            options: QueryOptions::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Request for "which objects does S reach" / "who reaches O" lookups.
#[derive(Debug, Clone)]
pub struct AuthLookupRequest {
    pub entity: EntityRef,
    pub pattern: EntityPattern,
    pub options: QueryOptions,
}

impl AuthLookupRequest {
    pub fn new(entity: EntityRef, pattern: EntityPattern) -> Self {
        Self {
            entity,
            pattern,
            options: QueryOptions::default(),
        }
    }
}

/// Request for an expansion tree.
#[derive(Debug, Clone)]
pub struct TreeRequest {
    pub root: EntityRef,
    pub direction: Direction,
    /// Capped at the configured maximum.
    pub max_depth: Option<u32>,
    pub options: QueryOptions,
}

impl TreeRequest {
    pub fn new(root: EntityRef, direction: Direction) -> Self {
        Self {
            root,
            direction,
            max_depth: None,
            options: QueryOptions::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// An edge that would close a cycle, with the existing path it would close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub edge: Edge,
    /// Path from `edge.object` back to `edge.subject`; empty for self-loops.
    pub path: Vec<Edge>,
}

impl CycleReport {
    /// `a -> b -> ... -> a` rendering of the cycle.
    pub fn describe(&self) -> String {
        let mut nodes = vec![self.edge.subject.to_string()];
        nodes.push(self.edge.object.to_string());
        for edge in &self.path {
            nodes.push(edge.object.to_string());
        }
        if self.path.is_empty() {
            nodes.truncate(1);
            nodes.push(self.edge.subject.to_string());
        }
        nodes.join(" -> ")
    }
}
