//! Property-based tests for path queries over small random graphs.

use std::collections::HashSet;

use proptest::prelude::*;

use super::mocks::{entity, MockGraph};
use crate::model::{Edge, EntityRef, SearchCondition};
use crate::resolver::context::TraversalContext;
use crate::resolver::traversal::{self, PathLimits};

const NODES: usize = 7;

fn node(i: usize) -> String {
    format!("n:{i}#r")
}

fn graph_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..NODES, 0..NODES), 0..18)
}

fn build(pairs: &[(usize, usize)]) -> MockGraph {
    let mut graph = MockGraph::new();
    for (object, subject) in pairs {
        graph.add(&node(*object), &node(*subject));
    }
    graph
}

fn unlimited() -> PathLimits {
    PathLimits {
        max_paths: usize::MAX,
        max_path_length: NODES + 1,
    }
}

fn assert_simple_path(path: &[Edge], from: &EntityRef, to: &EntityRef, graph: &MockGraph) {
    use crate::resolver::GraphSnapshot;

    assert_eq!(&path[0].subject, from);
    assert_eq!(&path[path.len() - 1].object, to);
    let mut seen: HashSet<&EntityRef> = HashSet::from([from]);
    for (i, edge) in path.iter().enumerate() {
        assert!(graph.outgoing(&edge.subject).contains(edge));
        if i + 1 < path.len() {
            assert_eq!(edge.object, path[i + 1].subject);
        }
        assert!(seen.insert(&edge.object), "node repeated in {path:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Property: check agrees with path enumeration.
    #[test]
    fn prop_check_matches_path_existence(
        pairs in graph_strategy(),
        from in 0..NODES,
        to in 0..NODES,
    ) {
        prop_assume!(from != to);
        let graph = build(&pairs);
        let (from, to) = (entity(&node(from)), entity(&node(to)));
        let search = SearchCondition::default();

        let allowed = traversal::reachable(
            &graph, &from, &to, &search, None, &mut TraversalContext::unbounded(),
        ).unwrap();
        let paths = traversal::all_paths(
            &graph, &from, &to, &search, unlimited(), &mut TraversalContext::unbounded(),
        ).unwrap();

        prop_assert_eq!(allowed, !paths.is_empty());
    }

    // Property: every enumerated path is simple, connected and unique, and
    // the shortest path is as short as the shortest enumerated one.
    #[test]
    fn prop_paths_are_simple_and_shortest_is_minimal(
        pairs in graph_strategy(),
        from in 0..NODES,
        to in 0..NODES,
    ) {
        prop_assume!(from != to);
        let graph = build(&pairs);
        let (from, to) = (entity(&node(from)), entity(&node(to)));
        let search = SearchCondition::default();

        let paths = traversal::all_paths(
            &graph, &from, &to, &search, unlimited(), &mut TraversalContext::unbounded(),
        ).unwrap();
        let shortest = traversal::shortest_path(
            &graph, &from, &to, &search, &mut TraversalContext::unbounded(),
        ).unwrap();

        let unique: HashSet<&Vec<Edge>> = paths.iter().collect();
        prop_assert_eq!(unique.len(), paths.len());
        for path in &paths {
            assert_simple_path(path, &from, &to, &graph);
        }

        match paths.iter().map(Vec::len).min() {
            Some(min) => {
                prop_assert_eq!(shortest.len(), min);
                assert_simple_path(&shortest, &from, &to, &graph);
            }
            None => prop_assert!(shortest.is_empty()),
        }
    }

    // Property: the shortest path does not depend on when it is computed.
    #[test]
    fn prop_shortest_path_is_deterministic(
        pairs in graph_strategy(),
        from in 0..NODES,
        to in 0..NODES,
    ) {
        let graph = build(&pairs);
        let (from, to) = (entity(&node(from)), entity(&node(to)));
        let search = SearchCondition::default();

        let first = traversal::shortest_path(
            &graph, &from, &to, &search, &mut TraversalContext::unbounded(),
        ).unwrap();
        let second = traversal::shortest_path(
            &graph, &from, &to, &search, &mut TraversalContext::unbounded(),
        ).unwrap();
        prop_assert_eq!(first, second);
    }
}
