//! Synchronous graph traversals over a snapshot.
//!
//! Every node is an `(namespace, name, relation)` triple and every stored edge
//! is a step from its subject node to its object node. A userset subject is
//! just another node, so following the edges out of `group:eng#member` is the
//! userset expansion step. All searches are iterative with explicit frontiers
//! and carry a visited set, so cyclic graphs terminate.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{DomainError, DomainResult};
use crate::model::{
    Action, CollectCondition, Direction, Edge, EntityRef, Operation, SearchCondition, TreeNode,
};

use super::context::TraversalContext;
use super::overlay::OverlaySnapshot;
use super::traits::GraphSnapshot;
use super::types::CycleReport;

/// Breadth-first reachability from `subject` to `target`.
///
/// With `max_depth`, paths longer than that many edges are not explored; if
/// that leaves part of the graph unexplored without a positive answer the
/// search fails rather than answering `false`.
pub(crate) fn reachable(
    snapshot: &dyn GraphSnapshot,
    subject: &EntityRef,
    target: &EntityRef,
    search: &SearchCondition,
    max_depth: Option<u32>,
    ctx: &mut TraversalContext,
) -> DomainResult<bool> {
    let mut visited = HashSet::from([subject.clone()]);
    let mut frontier = VecDeque::from([(subject.clone(), 0u32)]);
    let mut cut_off = false;

    while let Some((node, depth)) = frontier.pop_front() {
        ctx.tick()?;
        let edges = snapshot.outgoing(&node);
        if max_depth.is_some_and(|max| depth >= max) {
            cut_off |= !edges.is_empty();
            continue;
        }
        for edge in edges {
            if edge.object == *target {
                return Ok(true);
            }
            if search.should_expand(&edge.object) && visited.insert(edge.object.clone()) {
                frontier.push_back((edge.object, depth + 1));
            }
        }
    }

    match max_depth {
        Some(max_depth) if cut_off => Err(DomainError::DepthLimitExceeded { max_depth }),
        _ => Ok(false),
    }
}

/// Breadth-first search recording predecessor edges. Ties go to the edge
/// inserted first, because adjacency lists are in insertion order.
pub(crate) fn shortest_path(
    snapshot: &dyn GraphSnapshot,
    subject: &EntityRef,
    target: &EntityRef,
    search: &SearchCondition,
    ctx: &mut TraversalContext,
) -> DomainResult<Vec<Edge>> {
    let mut predecessor: HashMap<EntityRef, Edge> = HashMap::new();
    let mut visited = HashSet::from([subject.clone()]);
    let mut frontier = VecDeque::from([subject.clone()]);

    while let Some(node) = frontier.pop_front() {
        ctx.tick()?;
        for edge in snapshot.outgoing(&node) {
            if edge.object == *target {
                return Ok(rebuild_path(&predecessor, subject, edge));
            }
            if search.should_expand(&edge.object) && visited.insert(edge.object.clone()) {
                let next = edge.object.clone();
                predecessor.insert(next.clone(), edge);
                frontier.push_back(next);
            }
        }
    }
    Ok(Vec::new())
}

fn rebuild_path(
    predecessor: &HashMap<EntityRef, Edge>,
    subject: &EntityRef,
    last: Edge,
) -> Vec<Edge> {
    let mut cursor = last.subject.clone();
    let mut path = vec![last];
    while cursor != *subject {
        let Some(edge) = predecessor.get(&cursor) else {
            break;
        };
        cursor = edge.subject.clone();
        path.push(edge.clone());
    }
    path.reverse();
    path
}

/// Caps for [`all_paths`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathLimits {
    pub(crate) max_paths: usize,
    pub(crate) max_path_length: usize,
}

/// Depth-first enumeration of every simple path from `subject` to `target`.
///
/// The visited set holds only the nodes on the current branch, so sibling
/// branches may share nodes. Exceeding either cap is an error, never a
/// silently truncated answer.
///
/// `max_path_length` bounds the explored depth, not only the returned
/// paths: descending past it fails even when that branch is a dead end
/// and every path to `target` is shorter.
pub(crate) fn all_paths(
    snapshot: &dyn GraphSnapshot,
    subject: &EntityRef,
    target: &EntityRef,
    search: &SearchCondition,
    limits: PathLimits,
    ctx: &mut TraversalContext,
) -> DomainResult<Vec<Vec<Edge>>> {
    struct Frame {
        edges: Vec<Edge>,
        next: usize,
    }

    let mut paths = Vec::new();
    let mut path: Vec<Edge> = Vec::new();
    let mut on_path = HashSet::from([subject.clone()]);
    let mut stack = vec![Frame {
        edges: snapshot.outgoing(subject),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        ctx.tick()?;
        let Some(edge) = frame.edges.get(frame.next).cloned() else {
            stack.pop();
            if let Some(edge) = path.pop() {
                on_path.remove(&edge.object);
            }
            continue;
        };
        frame.next += 1;

        if edge.object == *target {
            if paths.len() == limits.max_paths {
                return Err(DomainError::PathLimitExceeded {
                    limit: limits.max_paths,
                    what: "paths",
                });
            }
            let mut found = path.clone();
            found.push(edge);
            paths.push(found);
            continue;
        }
        if on_path.contains(&edge.object) || !search.should_expand(&edge.object) {
            continue;
        }

        let edges = snapshot.outgoing(&edge.object);
        if edges.is_empty() {
            continue;
        }
        // Anything found below this node has at least path.len() + 2 edges.
        if path.len() + 2 > limits.max_path_length {
            return Err(DomainError::PathLimitExceeded {
                limit: limits.max_path_length,
                what: "edges in a path",
            });
        }
        on_path.insert(edge.object.clone());
        path.push(edge);
        stack.push(Frame { edges, next: 0 });
    }
    Ok(paths)
}

fn neighbours(
    snapshot: &dyn GraphSnapshot,
    node: &EntityRef,
    direction: Direction,
) -> Vec<EntityRef> {
    match direction {
        Direction::Forward => snapshot.outgoing(node).into_iter().map(|e| e.object).collect(),
        Direction::Reverse => snapshot.incoming(node).into_iter().map(|e| e.subject).collect(),
    }
}

/// Breadth-first closure from `root`, reporting each reached node once in
/// discovery order. `max_depth` of `None` or `0` means unbounded.
pub(crate) fn related(
    snapshot: &dyn GraphSnapshot,
    root: &EntityRef,
    direction: Direction,
    max_depth: Option<u32>,
    search: &SearchCondition,
    collect: &CollectCondition,
    ctx: &mut TraversalContext,
) -> DomainResult<Vec<EntityRef>> {
    let max_depth = max_depth.filter(|depth| *depth > 0);
    let mut visited = HashSet::from([root.clone()]);
    let mut reported = HashSet::new();
    let mut collected = Vec::new();
    let mut frontier = VecDeque::from([(root.clone(), 0u32)]);

    while let Some((node, depth)) = frontier.pop_front() {
        ctx.tick()?;
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for next in neighbours(snapshot, &node, direction) {
            if collect.should_collect(&next) && reported.insert(next.clone()) {
                collected.push(next.clone());
            }
            if search.should_expand(&next) && visited.insert(next.clone()) {
                frontier.push_back((next, depth + 1));
            }
        }
    }
    Ok(collected)
}

/// Caps for [`build_tree`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeLimits {
    pub(crate) max_depth: u32,
    pub(crate) max_nodes: usize,
}

/// Builds the expansion tree under `root`.
///
/// A node already on its own root-to-node path becomes a `cycle` leaf. A node
/// at the depth limit that still has neighbours is marked `truncated`.
pub(crate) fn build_tree(
    snapshot: &dyn GraphSnapshot,
    root: &EntityRef,
    direction: Direction,
    limits: TreeLimits,
    ctx: &mut TraversalContext,
) -> DomainResult<TreeNode> {
    struct Slot {
        entity: EntityRef,
        parent: Option<usize>,
        depth: u32,
        children: Vec<usize>,
        cycle: bool,
        truncated: bool,
    }

    fn on_path(arena: &[Slot], from: usize, entity: &EntityRef) -> bool {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            if arena[id].entity == *entity {
                return true;
            }
            cursor = arena[id].parent;
        }
        false
    }

    let mut arena = vec![Slot {
        entity: root.clone(),
        parent: None,
        depth: 0,
        children: Vec::new(),
        cycle: false,
        truncated: false,
    }];
    let mut stack = vec![0usize];

    while let Some(id) = stack.pop() {
        ctx.tick()?;
        let next = neighbours(snapshot, &arena[id].entity, direction);
        if next.is_empty() {
            continue;
        }
        if arena[id].depth >= limits.max_depth {
            arena[id].truncated = true;
            continue;
        }
        for entity in next {
            if arena.len() >= limits.max_nodes {
                return Err(DomainError::TreeLimitExceeded {
                    max_nodes: limits.max_nodes,
                });
            }
            let cycle = on_path(&arena, id, &entity);
            let child = arena.len();
            let depth = arena[id].depth + 1;
            arena.push(Slot {
                entity,
                parent: Some(id),
                depth,
                children: Vec::new(),
                cycle,
                truncated: false,
            });
            arena[id].children.push(child);
            if !cycle {
                stack.push(child);
            }
        }
    }

    // Children always sit at higher indices than their parent, so a reverse
    // sweep assembles the tree bottom-up.
    let mut built: Vec<Option<TreeNode>> = (0..arena.len()).map(|_| None).collect();
    for (id, slot) in arena.into_iter().enumerate().rev() {
        let children = slot
            .children
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[id] = Some(TreeNode {
            entity: slot.entity,
            children,
            cycle: slot.cycle,
            truncated: slot.truncated,
        });
    }
    built
        .first_mut()
        .and_then(Option::take)
        .ok_or_else(|| DomainError::Internal {
            message: "tree assembly lost its root".to_string(),
        })
}

/// Finds the first create in `operations` that would close a cycle once the
/// operations before it are applied.
///
/// Adding `subject -> object` closes a cycle exactly when `subject` is
/// already reachable from `object`.
pub(crate) fn find_cycle(
    overlay: &mut OverlaySnapshot,
    operations: &[Operation],
    ctx: &mut TraversalContext,
) -> DomainResult<Option<CycleReport>> {
    let unrestricted = SearchCondition::default();
    for operation in operations {
        let edge = &operation.edge;
        match operation.action {
            Action::Delete => overlay.remove(edge.clone()),
            Action::Create | Action::CreateIfNotExist => {
                if edge.subject == edge.object {
                    return Ok(Some(CycleReport {
                        edge: edge.clone(),
                        path: Vec::new(),
                    }));
                }
                let path =
                    shortest_path(&*overlay, &edge.object, &edge.subject, &unrestricted, ctx)?;
                if !path.is_empty() {
                    return Ok(Some(CycleReport {
                        edge: edge.clone(),
                        path,
                    }));
                }
                overlay.add(edge.clone());
            }
        }
    }
    Ok(None)
}
