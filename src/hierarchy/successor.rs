//! One-hop successor projection of a graph under an edge matcher.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::graph::{GraphEdge, GraphModel, GraphNode};
use crate::relation::EdgeMatcher;

/// The matched edges leaving one node, in either direction.
///
/// `forward` edges have the node as head and lead to their tail; `reverse`
/// edges have the node as tail and lead to their head.
#[derive(Debug, Clone)]
pub struct SuccessorEdges {
    node: Arc<GraphNode>,
    forward: Vec<GraphEdge>,
    reverse: Vec<GraphEdge>,
}

impl SuccessorEdges {
    fn new(node: Arc<GraphNode>) -> Self {
        Self {
            node,
            forward: Vec::new(),
            reverse: Vec::new(),
        }
    }

    pub fn node(&self) -> &Arc<GraphNode> {
        &self.node
    }

    pub fn forward_edges(&self) -> &[GraphEdge] {
        &self.forward
    }

    pub fn reverse_edges(&self) -> &[GraphEdge] {
        &self.reverse
    }

    pub fn edge_count(&self) -> usize {
        self.forward.len() + self.reverse.len()
    }

    /// Distinct one-hop successors: forward tails first, then reverse heads,
    /// each in edge order.
    pub fn successor_nodes(&self) -> Vec<Arc<GraphNode>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let forward = self.forward.iter().map(GraphEdge::tail);
        let reverse = self.reverse.iter().map(GraphEdge::head);
        for node in forward.chain(reverse) {
            if seen.insert(node.id()) {
                result.push(node.clone());
            }
        }
        result
    }
}

/// Map every node to the successors reachable over one matched edge.
///
/// A node is a successor of `n` when an edge has `n` as head and matches
/// forward, or has `n` as tail and matches reverse. Self-loops never count,
/// and nodes without successors are left out of the map. This is not a
/// closure and does no cycle elimination: walkers need their own visited set.
pub fn compute_spanning_hierarchy<M>(graph: &GraphModel, matcher: &M) -> HashMap<String, SuccessorEdges>
where
    M: EdgeMatcher + ?Sized,
{
    let mut hierarchy: HashMap<String, SuccessorEdges> = HashMap::new();

    for edge in graph.edges() {
        if edge.is_self_loop() {
            continue;
        }
        if matcher.edge_forward(edge) {
            hierarchy
                .entry(edge.head().id().to_string())
                .or_insert_with(|| SuccessorEdges::new(edge.head().clone()))
                .forward
                .push(edge.clone());
        }
        if matcher.edge_reverse(edge) {
            hierarchy
                .entry(edge.tail().id().to_string())
                .or_insert_with(|| SuccessorEdges::new(edge.tail().clone()))
                .reverse
                .push(edge.clone());
        }
    }

    debug!(
        nodes = graph.node_count(),
        parents = hierarchy.len(),
        "computed successor hierarchy"
    );
    hierarchy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, NodeKind};
    use crate::relation::{
        BinaryEdgeMatcher, BuiltinRelation, RelationId, RelationRegistry, RelationSet, EMPTY, FORWARD,
    };

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, NodeKind::GENERIC)
    }

    fn ids(nodes: &[Arc<GraphNode>]) -> Vec<&str> {
        nodes.iter().map(|n| n.id()).collect()
    }

    fn sample() -> (GraphModel, RelationId, RelationId) {
        let mut registry = RelationRegistry::new();
        let contains = registry.builtin(BuiltinRelation::Contains);
        let calls = registry.builtin(BuiltinRelation::Calls);
        let mut builder = GraphBuilder::new();
        builder.add_dependency(node("dir"), node("a"), contains);
        builder.add_dependency(node("dir"), node("b"), contains);
        builder.add_dependency(node("a"), node("b"), calls);
        builder.add_dependency(node("a"), node("b"), contains);
        builder.map_node(node("isolated"));
        (builder.create_graph_model(), contains, calls)
    }

    #[test]
    fn test_self_loop_only_gives_empty_map() {
        let mut registry = RelationRegistry::new();
        let calls = registry.builtin(BuiltinRelation::Calls);
        let mut builder = GraphBuilder::new();
        builder.add_dependency(node("recursive"), node("recursive"), calls);
        let graph = builder.create_graph_model();

        assert_eq!(graph.edge_count(), 1);
        assert!(compute_spanning_hierarchy(&graph, &FORWARD).is_empty());
    }

    #[test]
    fn test_forward_hierarchy() {
        let (graph, _, _) = sample();
        let hierarchy = compute_spanning_hierarchy(&graph, &FORWARD);

        assert_eq!(hierarchy.len(), 2);
        assert!(!hierarchy.contains_key("b"));
        assert!(!hierarchy.contains_key("isolated"));
        assert_eq!(ids(&hierarchy["dir"].successor_nodes()), vec!["a", "b"]);

        // Two edges to the same successor collapse to one node.
        assert_eq!(hierarchy["a"].edge_count(), 2);
        assert_eq!(ids(&hierarchy["a"].successor_nodes()), vec!["b"]);
    }

    #[test]
    fn test_reverse_hierarchy_flips_view() {
        let (graph, contains, _) = sample();
        let matcher = BinaryEdgeMatcher::new(RelationSet::EMPTY, RelationSet::single(contains));
        let hierarchy = compute_spanning_hierarchy(&graph, &matcher);

        assert_eq!(ids(&hierarchy["b"].successor_nodes()), vec!["dir", "a"]);
        assert_eq!(ids(&hierarchy["a"].successor_nodes()), vec!["dir"]);
        assert!(!hierarchy.contains_key("dir"));
    }

    #[test]
    fn test_empty_matcher() {
        let (graph, _, _) = sample();
        assert!(compute_spanning_hierarchy(&graph, &EMPTY).is_empty());
    }

    #[test]
    fn test_cycle_is_not_broken() {
        let mut registry = RelationRegistry::new();
        let calls = registry.builtin(BuiltinRelation::Calls);
        let mut builder = GraphBuilder::new();
        builder.add_dependency(node("a"), node("b"), calls);
        builder.add_dependency(node("b"), node("a"), calls);
        let graph = builder.create_graph_model();

        let hierarchy = compute_spanning_hierarchy(&graph, &FORWARD);
        assert_eq!(ids(&hierarchy["a"].successor_nodes()), vec!["b"]);
        assert_eq!(ids(&hierarchy["b"].successor_nodes()), vec!["a"]);
    }
}
