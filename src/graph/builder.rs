//! Graph builder: stages nodes and edges and yields an immutable graph.
//!
//! Nodes are deduplicated by id, edges by `(head, tail, relation)`. The
//! derived helpers at the bottom of this file build new graphs out of an
//! existing one; they never touch the source graph.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

use super::model::GraphModel;
use super::types::{EdgeKey, GraphEdge, GraphNode};
use crate::error::{DepanError, Result};
use crate::relation::RelationId;

/// Staging area for a single [`GraphModel`].
///
/// Use it once: after [`create_graph_model`](Self::create_graph_model) the
/// builder is consumed.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DiGraph<Arc<GraphNode>, GraphEdge>,
    node_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<EdgeKey, EdgeIndex>,
}

impl GraphBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty builder with room for `nodes` nodes and `edges` edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_index: HashMap::with_capacity(nodes),
            edge_index: HashMap::with_capacity(edges),
        }
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Insert a node whose id must not exist yet.
    pub fn new_node(&mut self, node: impl Into<Arc<GraphNode>>) -> Result<Arc<GraphNode>> {
        let node = node.into();
        if self.node_index.contains_key(node.id()) {
            return Err(DepanError::DuplicateNodeId(node.id().to_string()));
        }
        Ok(self.insert_node(node))
    }

    /// Get-or-create by id. Returns the stored node when the id is known,
    /// otherwise stores and returns `node`.
    pub fn map_node(&mut self, node: impl Into<Arc<GraphNode>>) -> Arc<GraphNode> {
        let node = node.into();
        match self.node_index.get(node.id()) {
            Some(&idx) => self.graph[idx].clone(),
            None => self.insert_node(node),
        }
    }

    /// Staged node with this id.
    pub fn find_node(&self, id: &str) -> Option<&Arc<GraphNode>> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Whether a node with this id is staged.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    fn insert_node(&mut self, node: Arc<GraphNode>) -> Arc<GraphNode> {
        let id = node.id().to_string();
        let idx = self.graph.add_node(node.clone());
        self.node_index.insert(id, idx);
        node
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add an edge. If an equal triple is already staged the stored edge is
    /// kept and this call does nothing; the argument is returned either way.
    ///
    /// Endpoints are mapped into the builder, so an edge may arrive before
    /// its nodes do. The stored edge references the builder's own nodes.
    pub fn add_edge(&mut self, edge: GraphEdge) -> GraphEdge {
        let key = edge.key();
        if self.edge_index.contains_key(&key) {
            trace!(edge = %edge, "suppressed duplicate edge");
            return edge;
        }
        let head = self.map_node(edge.head().clone());
        let tail = self.map_node(edge.tail().clone());
        let head_idx = self.node_index[head.id()];
        let tail_idx = self.node_index[tail.id()];
        let stored = GraphEdge::new(head, tail, edge.relation());
        let idx = self.graph.add_edge(head_idx, tail_idx, stored);
        self.edge_index.insert(key, idx);
        edge
    }

    /// Map both endpoints and connect them.
    pub fn add_dependency(
        &mut self,
        head: impl Into<Arc<GraphNode>>,
        tail: impl Into<Arc<GraphNode>>,
        relation: RelationId,
    ) -> GraphEdge {
        let head = self.map_node(head);
        let tail = self.map_node(tail);
        self.add_edge(GraphEdge::new(head, tail, relation))
    }

    /// Number of staged nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of staged edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Finalize the staged nodes and edges.
    pub fn create_graph_model(self) -> GraphModel {
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "created graph model"
        );
        GraphModel::from_parts(self.graph, self.node_index, self.edge_index)
    }
}

// ─── Derived Graphs ─────────────────────────────────────────────

/// A new graph holding exactly `edges` and the nodes they touch.
///
/// Endpoints are resolved against `master`, so the result shares node
/// objects with it.
pub fn build_from_edges<'a, I>(master: &GraphModel, edges: I) -> GraphModel
where
    I: IntoIterator<Item = &'a GraphEdge>,
{
    let mut builder = GraphBuilder::new();
    for edge in edges {
        let head = master
            .find_node(edge.head().id())
            .cloned()
            .unwrap_or_else(|| edge.head().clone());
        let tail = master
            .find_node(edge.tail().id())
            .cloned()
            .unwrap_or_else(|| edge.tail().clone());
        builder.add_dependency(head, tail, edge.relation());
    }
    builder.create_graph_model()
}

/// A new graph holding every node of `nodes` (isolated ones included) and
/// every edge of `master` whose endpoints are both among them.
pub fn build_from_nodes<'a, I>(master: &GraphModel, nodes: I) -> GraphModel
where
    I: IntoIterator<Item = &'a Arc<GraphNode>>,
{
    let mut builder = GraphBuilder::new();
    let mut ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        let node = master.find_node(node.id()).unwrap_or(node);
        builder.map_node(node.clone());
        ids.insert(node.id());
    }
    for edge in master.edges() {
        if ids.contains(edge.head().id()) && ids.contains(edge.tail().id()) {
            builder.add_edge(edge.clone());
        }
    }
    builder.create_graph_model()
}

/// Union of two graphs. Nodes of `a` win on id clashes.
pub fn merge(a: &GraphModel, b: &GraphModel) -> GraphModel {
    let mut builder = GraphBuilder::with_capacity(
        a.node_count() + b.node_count(),
        a.edge_count() + b.edge_count(),
    );
    for node in a.nodes().chain(b.nodes()) {
        builder.map_node(node.clone());
    }
    for edge in a.edges().chain(b.edges()) {
        builder.add_dependency(edge.head().clone(), edge.tail().clone(), edge.relation());
    }
    builder.create_graph_model()
}

/// Nodes of `a` whose id is absent from `b`, with `a`'s edges among them.
pub fn subtract(a: &GraphModel, b: &GraphModel) -> GraphModel {
    let kept: Vec<&Arc<GraphNode>> = a.nodes().filter(|n| !b.contains_node(n.id())).collect();
    build_from_nodes(a, kept)
}
