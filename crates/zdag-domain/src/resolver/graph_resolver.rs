//! Graph resolver: async entry points for every read query.
//!
//! # Execution model
//!
//! - **Snapshots**: each query takes one snapshot from the [`EdgeReader`] and
//!   runs entirely against it, so results reflect a single point in time and
//!   writers are never blocked by a slow traversal.
//! - **Blocking pool**: traversals are CPU-bound and run under
//!   `tokio::task::spawn_blocking`.
//! - **Timeout and cancellation**: the traversal polls a deadline and two
//!   cancellation flags: the caller's optional [`CancelToken`] and an internal
//!   one that is raised when the query future is dropped or times out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{Direction, Edge, EntityRef, Operation, TreeNode};
use crate::validation::{validate_object, validate_subject};

use super::config::ResolverConfig;
use super::context::{CancelOnDrop, CancelToken, TraversalContext};
use super::overlay::OverlaySnapshot;
use super::traits::{EdgeReader, GraphSnapshot};
use super::traversal::{self, PathLimits, TreeLimits};
use super::types::{
    AuthLookupRequest, CheckRequest, CheckResult, CycleReport, PathRequest, QueryOptions,
    RelationsRequest, TreeRequest,
};

/// Graph resolver for checks, path queries, closures and trees.
pub struct GraphResolver<R> {
    reader: Arc<R>,
    config: ResolverConfig,
}

impl<R> GraphResolver<R>
where
    R: EdgeReader + 'static,
{
    /// Creates a new graph resolver with the default configuration.
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_config(reader, ResolverConfig::default())
    }

    /// Creates a new graph resolver with custom configuration.
    pub fn with_config(reader: Arc<R>, config: ResolverConfig) -> Self {
        Self { reader, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Is `request.object` reachable from `request.subject`?
    pub async fn check(&self, request: &CheckRequest) -> DomainResult<CheckResult> {
        validate_subject(&request.subject)?;
        validate_object(&request.object)?;

        let subject = request.subject.clone();
        let object = request.object.clone();
        let search = request.search.clone();
        let max_depth = self.config.max_check_depth;
        let allowed = self
            .run("check", &request.options, move |snapshot, ctx| {
                traversal::reachable(&*snapshot, &subject, &object, &search, max_depth, ctx)
            })
            .await?;

        debug!(
            subject = %request.subject,
            object = %request.object,
            allowed,
            "check resolved"
        );
        Ok(CheckResult { allowed })
    }

    /// Minimal-hop path from subject to object, or empty when disconnected.
    pub async fn shortest_path(&self, request: &PathRequest) -> DomainResult<Vec<Edge>> {
        validate_subject(&request.subject)?;
        validate_object(&request.object)?;

        let subject = request.subject.clone();
        let object = request.object.clone();
        let search = request.search.clone();
        self.run("shortest_path", &request.options, move |snapshot, ctx| {
            traversal::shortest_path(&*snapshot, &subject, &object, &search, ctx)
        })
        .await
    }

    /// Every simple path from subject to object.
    ///
    /// Fails with `PathLimitExceeded` once `max_paths` paths are exceeded or
    /// the search descends past `max_path_length` edges, whether or not the
    /// deeper branch reaches the object.
    pub async fn all_paths(&self, request: &PathRequest) -> DomainResult<Vec<Vec<Edge>>> {
        validate_subject(&request.subject)?;
        validate_object(&request.object)?;

        let subject = request.subject.clone();
        let object = request.object.clone();
        let search = request.search.clone();
        let limits = PathLimits {
            max_paths: self.config.max_paths,
            max_path_length: self.config.max_path_length,
        };
        let paths = self
            .run("all_paths", &request.options, move |snapshot, ctx| {
                traversal::all_paths(&*snapshot, &subject, &object, &search, limits, ctx)
            })
            .await?;

        debug!(
            subject = %request.subject,
            object = %request.object,
            count = paths.len(),
            "enumerated paths"
        );
        Ok(paths)
    }

    /// Objects reachable from a subject (`Forward`) or subjects reaching an
    /// object (`Reverse`).
    pub async fn related(&self, request: &RelationsRequest) -> DomainResult<Vec<EntityRef>> {
        match request.direction {
            Direction::Forward => validate_subject(&request.root)?,
            Direction::Reverse => validate_object(&request.root)?,
        }

        let request_owned = request.clone();
        self.run("related", &request.options, move |snapshot, ctx| {
            let RelationsRequest {
                root,
                direction,
                max_depth,
                search,
                collect,
                ..
            } = request_owned;
            traversal::related(&*snapshot, &root, direction, max_depth, &search, &collect, ctx)
        })
        .await
    }

    /// Objects matching `request.pattern` that `request.entity` reaches.
    pub async fn objects_with_auth(
        &self,
        request: &AuthLookupRequest,
    ) -> DomainResult<Vec<EntityRef>> {
        validate_subject(&request.entity)?;
        self.lookup(request, Direction::Forward).await
    }

    /// Subjects matching `request.pattern` that reach `request.entity`.
    pub async fn subjects_with_auth(
        &self,
        request: &AuthLookupRequest,
    ) -> DomainResult<Vec<EntityRef>> {
        validate_object(&request.entity)?;
        self.lookup(request, Direction::Reverse).await
    }

    async fn lookup(
        &self,
        request: &AuthLookupRequest,
        direction: Direction,
    ) -> DomainResult<Vec<EntityRef>> {
        let entity = request.entity.clone();
        let pattern = request.pattern.clone();
        self.run("auth_lookup", &request.options, move |snapshot, ctx| {
            let reached = traversal::related(
                &*snapshot,
                &entity,
                direction,
                None,
                &Default::default(),
                &Default::default(),
                ctx,
            )?;
            Ok(reached
                .into_iter()
                .filter(|node| pattern.matches(node))
                .collect())
        })
        .await
    }

    /// Expansion tree rooted at `request.root`.
    pub async fn build_tree(&self, request: &TreeRequest) -> DomainResult<TreeNode> {
        match request.direction {
            Direction::Forward => validate_subject(&request.root)?,
            Direction::Reverse => validate_object(&request.root)?,
        }

        let root = request.root.clone();
        let direction = request.direction;
        let limits = self.tree_limits(request.max_depth);
        self.run("build_tree", &request.options, move |snapshot, ctx| {
            traversal::build_tree(&*snapshot, &root, direction, limits, ctx)
        })
        .await
    }

    /// Forward trees covering every edge of the graph.
    ///
    /// Sources are rooted first, in order of first appearance. Any subject
    /// not yet expanded by an earlier tree then roots a tree of its own, so
    /// cyclic components without a source still appear. The node limit
    /// applies to the whole forest.
    pub async fn forest(
        &self,
        max_depth: Option<u32>,
        options: &QueryOptions,
    ) -> DomainResult<Vec<TreeNode>> {
        let limits = self.tree_limits(max_depth);
        self.run("forest", options, move |snapshot, ctx| {
            let mut trees = Vec::new();
            let mut expanded = HashSet::new();
            let mut remaining = limits.max_nodes;
            let roots = snapshot.sources().into_iter().chain(snapshot.subjects());
            for root in roots {
                if expanded.contains(&root) {
                    continue;
                }
                let tree = traversal::build_tree(
                    &*snapshot,
                    &root,
                    Direction::Forward,
                    TreeLimits {
                        max_nodes: remaining,
                        ..limits
                    },
                    ctx,
                )
                .map_err(|err| match err {
                    DomainError::TreeLimitExceeded { .. } => DomainError::TreeLimitExceeded {
                        max_nodes: limits.max_nodes,
                    },
                    other => other,
                })?;
                remaining = remaining.saturating_sub(tree.size());
                mark_expanded(&tree, &mut expanded);
                trees.push(tree);
            }
            Ok(trees)
        })
        .await
    }

    /// Returns the first create in `operations` that would close a cycle,
    /// evaluated against the current graph plus the preceding operations.
    pub async fn find_cycle(&self, operations: &[Operation]) -> DomainResult<Option<CycleReport>> {
        let operations = operations.to_vec();
        self.run("find_cycle", &QueryOptions::default(), move |snapshot, ctx| {
            let mut overlay = OverlaySnapshot::new(snapshot);
            traversal::find_cycle(&mut overlay, &operations, ctx)
        })
        .await
    }

    fn tree_limits(&self, requested: Option<u32>) -> TreeLimits {
        let max_depth = requested
            .filter(|depth| *depth > 0)
            .map_or(self.config.max_tree_depth, |depth| {
                depth.min(self.config.max_tree_depth)
            });
        TreeLimits {
            max_depth,
            max_nodes: self.config.max_tree_nodes,
        }
    }

    /// Runs `work` against a fresh snapshot on the blocking pool, bounded by
    /// the request's timeout and cancellation.
    async fn run<T, F>(
        &self,
        operation: &'static str,
        options: &QueryOptions,
        work: F,
    ) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn GraphSnapshot>, &mut TraversalContext) -> DomainResult<T>
            + Send
            + 'static,
    {
        let budget = options.timeout.unwrap_or(self.config.timeout);
        let started = Instant::now();
        let snapshot = self.reader.snapshot().await?;

        let internal = CancelToken::new();
        let _guard = CancelOnDrop(internal.clone());
        let mut ctx = TraversalContext::new(budget, internal.clone(), options.cancel.clone());

        let handle = tokio::task::spawn_blocking(move || {
            let result = work(snapshot, &mut ctx);
            (result, ctx.steps())
        });

        let result = match timeout(budget, handle).await {
            Ok(Ok((result, steps))) => {
                debug!(
                    operation,
                    steps,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "traversal finished"
                );
                result
            }
            Ok(Err(join_error)) => Err(DomainError::Internal {
                message: format!("{operation} traversal task failed: {join_error}"),
            }),
            Err(_) => {
                internal.cancel();
                Err(DomainError::Timeout {
                    duration_ms: duration_ms(budget),
                })
            }
        };

        if let Err(err) = &result {
            if is_limit(err) {
                warn!(operation, error = %err, "traversal aborted");
            }
        }
        result
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn is_limit(err: &DomainError) -> bool {
    matches!(
        err,
        DomainError::PathLimitExceeded { .. }
            | DomainError::TreeLimitExceeded { .. }
            | DomainError::DepthLimitExceeded { .. }
            | DomainError::Timeout { .. }
            | DomainError::Cancelled
    )
}

/// Records the nodes of `tree` whose children were listed. Cycle leaves are
/// expanded higher up their branch; truncated leaves are not expanded.
fn mark_expanded(tree: &TreeNode, expanded: &mut HashSet<EntityRef>) {
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        if !node.cycle && !node.truncated {
            expanded.insert(node.entity.clone());
        }
        stack.extend(node.children.iter());
    }
}
