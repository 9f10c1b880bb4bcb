//! The immutable graph value.
//!
//! Uses petgraph to store nodes and typed edges, with id and edge-triple
//! indexes for constant-time lookup. A `GraphModel` is only ever produced by
//! a [`GraphBuilder`](super::GraphBuilder); derived graphs are always new
//! values.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{EdgeKey, GraphEdge, GraphNode, GraphStats};
use crate::relation::RelationId;

/// A dependency graph: nodes keyed by unique id, plus a set of edges
/// deduplicated by `(head, tail, relation)`.
///
/// Every edge endpoint is a node of the same graph.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    graph: DiGraph<Arc<GraphNode>, GraphEdge>,
    node_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<EdgeKey, EdgeIndex>,
}

impl GraphModel {
    pub(crate) fn from_parts(
        graph: DiGraph<Arc<GraphNode>, GraphEdge>,
        node_index: HashMap<String, NodeIndex>,
        edge_index: HashMap<EdgeKey, EdgeIndex>,
    ) -> Self {
        Self {
            graph,
            node_index,
            edge_index,
        }
    }

    /// An empty graph.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    // ─── Node Queries ───────────────────────────────────────────

    /// Node with this id.
    pub fn find_node(&self, id: &str) -> Option<&Arc<GraphNode>> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<GraphNode>> {
        self.graph.node_weights()
    }

    // ─── Edge Queries ───────────────────────────────────────────

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    /// The stored edge for a triple, if any.
    pub fn find_edge(&self, head: &str, tail: &str, relation: RelationId) -> Option<&GraphEdge> {
        let key = EdgeKey {
            head: head.to_string(),
            tail: tail.to_string(),
            relation,
        };
        self.edge_index.get(&key).map(|&idx| &self.graph[idx])
    }

    /// Whether an edge with the same triple is stored.
    pub fn contains_edge(&self, edge: &GraphEdge) -> bool {
        self.edge_index.contains_key(&edge.key())
    }

    /// Edges whose head is `id`.
    pub fn outgoing(&self, id: &str) -> Vec<&GraphEdge> {
        self.directed(id, Direction::Outgoing)
    }

    /// Edges whose tail is `id`.
    pub fn incoming(&self, id: &str) -> Vec<&GraphEdge> {
        self.directed(id, Direction::Incoming)
    }

    fn directed(&self, id: &str, direction: Direction) -> Vec<&GraphEdge> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest-first; restore insertion order.
        let mut edges: Vec<(EdgeIndex, &GraphEdge)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(edge_idx, _)| *edge_idx);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    // ─── Stats ──────────────────────────────────────────────────

    /// Node, edge and per-relation edge counts.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphStats::default()
        };
        for edge in self.edges() {
            *stats.relation_counts.entry(edge.relation()).or_default() += 1;
        }
        stats
    }
}
