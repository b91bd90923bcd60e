//! Snapshot with pending, not yet written, changes layered on top.

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::{Edge, EntityRef};

use super::traits::GraphSnapshot;

/// A base snapshot plus edges added or removed by an in-flight batch.
pub struct OverlaySnapshot {
    base: Arc<dyn GraphSnapshot>,
    added: Vec<Edge>,
    removed: HashSet<Edge>,
}

impl OverlaySnapshot {
    pub fn new(base: Arc<dyn GraphSnapshot>) -> Self {
        Self {
            base,
            added: Vec::new(),
            removed: HashSet::new(),
        }
    }

    pub fn add(&mut self, edge: Edge) {
        self.removed.remove(&edge);
        if !self.added.contains(&edge) {
            self.added.push(edge);
        }
    }

    pub fn remove(&mut self, edge: Edge) {
        self.added.retain(|e| *e != edge);
        self.removed.insert(edge);
    }

    fn merge(&self, mut base: Vec<Edge>, pending: impl Iterator<Item = Edge>) -> Vec<Edge> {
        base.retain(|edge| !self.removed.contains(edge));
        for edge in pending {
            if !base.contains(&edge) {
                base.push(edge);
            }
        }
        base
    }
}

impl GraphSnapshot for OverlaySnapshot {
    fn outgoing(&self, node: &EntityRef) -> Vec<Edge> {
        let pending = self.added.iter().filter(|e| e.subject == *node).cloned();
        self.merge(self.base.outgoing(node), pending)
    }

    fn incoming(&self, node: &EntityRef) -> Vec<Edge> {
        let pending = self.added.iter().filter(|e| e.object == *node).cloned();
        self.merge(self.base.incoming(node), pending)
    }

    fn subjects(&self) -> Vec<EntityRef> {
        let mut seen = HashSet::new();
        self.base
            .subjects()
            .into_iter()
            .chain(self.added.iter().map(|e| e.subject.clone()))
            .filter(|node| seen.insert(node.clone()))
            .filter(|node| !self.outgoing(node).is_empty())
            .collect()
    }

    fn sources(&self) -> Vec<EntityRef> {
        // Only these nodes can have changed status.
        let candidates = self
            .base
            .sources()
            .into_iter()
            .chain(self.added.iter().map(|e| e.subject.clone()))
            .chain(self.removed.iter().map(|e| e.object.clone()));

        let mut seen = HashSet::new();
        candidates
            .filter(|node| seen.insert(node.clone()))
            .filter(|node| self.incoming(node).is_empty() && !self.outgoing(node).is_empty())
            .collect()
    }
}
