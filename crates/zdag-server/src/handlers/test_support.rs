//! In-memory graph implementing both storage traits, for handler tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use zdag_domain::error::{DomainError, DomainResult};
use zdag_domain::model::{Action, Edge, EdgeFilter, EntityRef, Operation};
use zdag_domain::resolver::{EdgeReader, EdgeWriter, GraphSnapshot};

pub fn edge(object: &str, subject: &str) -> Edge {
    Edge::new(
        EntityRef::parse(object).unwrap(),
        EntityRef::parse(subject).unwrap(),
    )
}

#[derive(Default)]
pub struct MemoryGraph {
    edges: Mutex<Vec<Edge>>,
}

impl MemoryGraph {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.lock().clone()
    }
}

struct EdgeList(Vec<Edge>);

impl GraphSnapshot for EdgeList {
    fn outgoing(&self, node: &EntityRef) -> Vec<Edge> {
        self.0.iter().filter(|e| e.subject == *node).cloned().collect()
    }

    fn incoming(&self, node: &EntityRef) -> Vec<Edge> {
        self.0.iter().filter(|e| e.object == *node).cloned().collect()
    }

    fn subjects(&self) -> Vec<EntityRef> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|e| &e.subject)
            .filter(|s| seen.insert(*s))
            .cloned()
            .collect()
    }

    fn sources(&self) -> Vec<EntityRef> {
        let objects: HashSet<&EntityRef> = self.0.iter().map(|e| &e.object).collect();
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|e| &e.subject)
            .filter(|s| !objects.contains(s) && seen.insert(*s))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EdgeReader for MemoryGraph {
    async fn snapshot(&self) -> DomainResult<Arc<dyn GraphSnapshot>> {
        Ok(Arc::new(EdgeList(self.edges())))
    }
}

fn insert(edges: &mut Vec<Edge>, edge: &Edge, exist_ok: bool) -> DomainResult<()> {
    if edges.contains(edge) {
        if exist_ok {
            return Ok(());
        }
        return Err(DomainError::AlreadyExists {
            edge: edge.to_string(),
        });
    }
    edges.push(edge.clone());
    Ok(())
}

#[async_trait]
impl EdgeWriter for MemoryGraph {
    async fn create(&self, edge: &Edge, exist_ok: bool) -> DomainResult<()> {
        insert(&mut self.edges.lock(), edge, exist_ok)
    }

    async fn delete(&self, edge: &Edge) -> DomainResult<bool> {
        let mut edges = self.edges.lock();
        let before = edges.len();
        edges.retain(|e| e != edge);
        Ok(edges.len() != before)
    }

    async fn delete_matching(&self, filters: &[EdgeFilter]) -> DomainResult<usize> {
        let mut edges = self.edges.lock();
        let before = edges.len();
        edges.retain(|e| !filters.iter().any(|f| f.matches(e)));
        Ok(before - edges.len())
    }

    async fn apply(&self, operations: &[Operation]) -> DomainResult<()> {
        let mut edges = self.edges.lock();
        let mut staged = edges.clone();
        for op in operations {
            match op.action {
                Action::Create => insert(&mut staged, &op.edge, false)?,
                Action::CreateIfNotExist => insert(&mut staged, &op.edge, true)?,
                Action::Delete => staged.retain(|e| *e != op.edge),
            }
        }
        *edges = staged;
        Ok(())
    }

    async fn clear_all(&self) -> DomainResult<()> {
        self.edges.lock().clear();
        Ok(())
    }
}
