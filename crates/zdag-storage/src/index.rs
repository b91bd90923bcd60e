//! Adjacency index over the edge set.
//!
//! Every edge gets a monotonically increasing sequence number on insert.
//! Both adjacency maps are ordered by that number, so lookups return edges
//! in insertion order and traversals built on top of them are deterministic.
//!
//! ```text
//!   edges      StoredEdge -> seq             (identity / existence)
//!   order      seq -> StoredEdge             (insertion order, pagination)
//!   by_object  object node  -> {seq -> edge} (who is related to X#rel)
//!   by_subject subject node -> {seq -> edge} (what does S reach in one hop)
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::traits::{NodeKey, StoredEdge};

type Adjacency = HashMap<NodeKey, BTreeMap<u64, Arc<StoredEdge>>>;

/// In-memory edge set with forward and reverse adjacency.
///
/// Cloning is shallow per edge (`Arc`), which keeps copy-on-write snapshots
/// affordable.
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    next_seq: u64,
    edges: HashMap<Arc<StoredEdge>, u64>,
    order: BTreeMap<u64, Arc<StoredEdge>>,
    by_object: Adjacency,
    by_subject: Adjacency,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, edge: &StoredEdge) -> bool {
        self.edges.contains_key(edge)
    }

    /// Inserts an edge into all indices. Returns false if it was already present.
    pub fn insert(&mut self, edge: StoredEdge) -> bool {
        if self.edges.contains_key(&edge) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;

        let object = edge.object_node();
        let subject = edge.subject_node();
        let edge = Arc::new(edge);

        self.edges.insert(Arc::clone(&edge), seq);
        self.order.insert(seq, Arc::clone(&edge));
        self.by_object
            .entry(object)
            .or_default()
            .insert(seq, Arc::clone(&edge));
        self.by_subject.entry(subject).or_default().insert(seq, edge);
        true
    }

    /// Removes an edge from all indices. Returns false if it was absent.
    pub fn remove(&mut self, edge: &StoredEdge) -> bool {
        let Some(seq) = self.edges.remove(edge) else {
            return false;
        };
        self.order.remove(&seq);
        detach(&mut self.by_object, &edge.object_node(), seq);
        detach(&mut self.by_subject, &edge.subject_node(), seq);
        true
    }

    /// Drops every edge. Sequence numbers keep increasing so that stale
    /// continuation tokens never resume inside newer data.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.order.clear();
        self.by_object.clear();
        self.by_subject.clear();
    }

    /// All edges in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredEdge> {
        self.order.values().map(|edge| edge.as_ref())
    }

    /// Edges with their sequence numbers, starting strictly after `after`.
    pub fn iter_after(&self, after: Option<u64>) -> impl Iterator<Item = (u64, &StoredEdge)> {
        let start = after.map_or(0, |seq| seq.saturating_add(1));
        self.order
            .range(start..)
            .map(|(seq, edge)| (*seq, edge.as_ref()))
    }

    /// Edges whose subject is `subject`, in insertion order.
    pub fn edges_from<'a>(&'a self, subject: &NodeKey) -> impl Iterator<Item = &'a StoredEdge> {
        self.by_subject
            .get(subject)
            .into_iter()
            .flat_map(|edges| edges.values())
            .map(|edge| edge.as_ref())
    }

    /// Edges whose object is `object`, in insertion order.
    pub fn edges_to<'a>(&'a self, object: &NodeKey) -> impl Iterator<Item = &'a StoredEdge> {
        self.by_object
            .get(object)
            .into_iter()
            .flat_map(|edges| edges.values())
            .map(|edge| edge.as_ref())
    }

    /// Distinct namespaces on either side of any edge, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces = BTreeSet::new();
        for edge in self.edges.keys() {
            namespaces.insert(edge.object_namespace.as_str());
            namespaces.insert(edge.subject_namespace.as_str());
        }
        namespaces.into_iter().map(str::to_string).collect()
    }

    /// Distinct subject nodes, in order of first appearance.
    pub fn subjects(&self) -> Vec<NodeKey> {
        let mut seen = HashSet::new();
        self.order
            .values()
            .map(|edge| edge.subject_node())
            .filter(|subject| seen.insert(subject.clone()))
            .collect()
    }

    /// Subject nodes that are never the object of an edge, in order of first
    /// appearance.
    pub fn sources(&self) -> Vec<NodeKey> {
        self.subjects()
            .into_iter()
            .filter(|subject| !self.by_object.contains_key(subject))
            .collect()
    }
}

fn detach(adjacency: &mut Adjacency, node: &NodeKey, seq: u64) {
    if let Some(edges) = adjacency.get_mut(node) {
        edges.remove(&seq);
        if edges.is_empty() {
            adjacency.remove(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(obj: &str, rel: &str, sbj: &str, sbj_rel: Option<&str>) -> StoredEdge {
        let (obj_ns, obj_name) = obj.split_once(':').unwrap();
        let (sbj_ns, sbj_name) = sbj.split_once(':').unwrap();
        StoredEdge::new(
            obj_ns,
            obj_name,
            rel,
            sbj_ns,
            sbj_name,
            sbj_rel.map(str::to_string),
        )
    }

    #[test]
    fn test_insert_updates_both_indices() {
        let mut index = EdgeIndex::new();
        let e = edge("role:rd", "parent", "role:rd-director", None);
        assert!(index.insert(e.clone()));

        assert_eq!(index.len(), 1);
        assert!(index.contains(&e));
        let subjects: Vec<_> = index
            .edges_to(&e.object_node())
            .map(StoredEdge::subject_node)
            .collect();
        assert_eq!(subjects, vec![e.subject_node()]);
        let objects: Vec<_> = index
            .edges_from(&e.subject_node())
            .map(StoredEdge::object_node)
            .collect();
        assert_eq!(objects, vec![e.object_node()]);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut index = EdgeIndex::new();
        let e = edge("doc:1", "viewer", "user:alice", None);
        assert!(index.insert(e.clone()));
        assert!(!index.insert(e));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_cleans_up_empty_adjacency() {
        let mut index = EdgeIndex::new();
        let e = edge("doc:1", "viewer", "user:alice", None);
        index.insert(e.clone());

        assert!(index.remove(&e));
        assert!(!index.remove(&e));
        assert!(index.is_empty());
        assert_eq!(index.edges_to(&e.object_node()).count(), 0);
        assert_eq!(index.edges_from(&e.subject_node()).count(), 0);
        assert!(index.subjects().is_empty());
    }

    // Test: adjacency lookups preserve insertion order
    #[test]
    fn test_adjacency_in_insertion_order() {
        let mut index = EdgeIndex::new();
        let subject = "user:alice";
        index.insert(edge("doc:3", "viewer", subject, None));
        index.insert(edge("doc:1", "viewer", subject, None));
        index.insert(edge("doc:2", "viewer", subject, None));

        let names: Vec<_> = index
            .edges_from(&NodeKey::new("user", "alice", None))
            .map(|e| e.object_name.as_str())
            .collect();
        assert_eq!(names, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_iter_after_resumes_past_sequence() {
        let mut index = EdgeIndex::new();
        for i in 0..5 {
            index.insert(edge(&format!("doc:{i}"), "viewer", "user:alice", None));
        }
        let seqs: Vec<u64> = index.iter_after(Some(2)).map(|(seq, _)| seq).collect();
        assert_eq!(seqs, vec![3, 4]);
        assert_eq!(index.iter_after(None).count(), 5);
    }

    #[test]
    fn test_clear_keeps_sequence_monotonic() {
        let mut index = EdgeIndex::new();
        index.insert(edge("doc:1", "viewer", "user:alice", None));
        index.clear();
        assert!(index.is_empty());

        index.insert(edge("doc:2", "viewer", "user:alice", None));
        let (seq, _) = index.iter_after(None).next().unwrap();
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_namespaces_cover_both_sides() {
        let mut index = EdgeIndex::new();
        index.insert(edge("doc:1", "viewer", "user:alice", None));
        index.insert(edge("folder:x", "owner", "group:eng", Some("member")));
        assert_eq!(index.namespaces(), vec!["doc", "folder", "group", "user"]);
    }

    #[test]
    fn test_sources_exclude_nodes_with_incoming_edges() {
        let mut index = EdgeIndex::new();
        index.insert(edge("group:eng", "member", "user:alice", None));
        index.insert(edge("doc:1", "viewer", "group:eng", Some("member")));
        index.insert(edge("doc:1", "viewer", "user:bob", None));

        let sources = index.sources();
        assert_eq!(
            sources,
            vec![
                NodeKey::new("user", "alice", None),
                NodeKey::new("user", "bob", None),
            ]
        );
        assert_eq!(
            index.subjects(),
            vec![
                NodeKey::new("user", "alice", None),
                NodeKey::new("group", "eng", Some("member".to_string())),
                NodeKey::new("user", "bob", None),
            ]
        );
    }

    // Test: clones are independent of later mutations
    #[test]
    fn test_clone_is_independent() {
        let mut index = EdgeIndex::new();
        index.insert(edge("doc:1", "viewer", "user:alice", None));
        let snapshot = index.clone();
        index.insert(edge("doc:2", "viewer", "user:alice", None));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(index.len(), 2);
    }
}
