//! Graph snapshots for saving and loading.
//!
//! A snapshot stores relations by key, never by id. Restoring re-interns
//! every key through the caller's [`RelationRegistry`], so the loaded graph
//! uses the same [`RelationId`](crate::relation::RelationId)s as code that
//! registered those relations live. The core does no file I/O; callers
//! read and write the encoded bytes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::builder::GraphBuilder;
use super::model::GraphModel;
use super::types::{GraphEdge, GraphNode};
use crate::error::{DepanError, Result};
use crate::relation::{RelationId, RelationRegistry};

/// Which analyzers contributed the nodes and relations of a graph, as
/// ordered lists of contributor ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyModel {
    #[serde(default)]
    pub node_contribs: Vec<String>,
    #[serde(default)]
    pub relation_contribs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub key: String,
    pub forward: String,
    pub reverse: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub head: String,
    pub tail: String,
    /// Relation key.
    pub relation: String,
}

/// Serializable form of a [`GraphModel`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub model: DependencyModel,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Capture a graph. Relations used by its edges must be registered in
    /// `registry`.
    pub fn capture(graph: &GraphModel, registry: &RelationRegistry, model: DependencyModel) -> Result<Self> {
        let mut relations = Vec::new();
        let mut keys: HashMap<RelationId, String> = HashMap::new();
        for edge in graph.edges() {
            if keys.contains_key(&edge.relation()) {
                continue;
            }
            let relation = registry
                .get(edge.relation())
                .ok_or_else(|| DepanError::UnknownRelation(edge.relation().to_string()))?;
            relations.push(RelationRecord {
                key: relation.key().to_string(),
                forward: relation.forward_name().to_string(),
                reverse: relation.reverse_name().to_string(),
            });
            keys.insert(edge.relation(), relation.key().to_string());
        }

        let edges = graph
            .edges()
            .map(|edge| EdgeRecord {
                head: edge.head().id().to_string(),
                tail: edge.tail().id().to_string(),
                relation: keys[&edge.relation()].clone(),
            })
            .collect();

        Ok(Self {
            model,
            relations,
            nodes: graph.nodes().map(|n| n.as_ref().clone()).collect(),
            edges,
        })
    }

    /// Rebuild the graph, interning its relations into `registry`.
    pub fn restore(&self, registry: &mut RelationRegistry) -> Result<GraphModel> {
        let mut ids: HashMap<&str, RelationId> = HashMap::with_capacity(self.relations.len());
        for record in &self.relations {
            let id = registry.register(&record.key, &record.forward, &record.reverse)?;
            ids.insert(record.key.as_str(), id);
        }

        let mut builder = GraphBuilder::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            builder.new_node(node.clone())?;
        }

        for record in &self.edges {
            let relation = match ids.get(record.relation.as_str()) {
                Some(&id) => id,
                None => registry.resolve(&record.relation)?,
            };
            let head = endpoint(&builder, &record.head)?;
            let tail = endpoint(&builder, &record.tail)?;
            builder.add_edge(GraphEdge::new(head, tail, relation));
        }

        info!(
            nodes = builder.node_count(),
            edges = builder.edge_count(),
            relations = self.relations.len(),
            "restored graph snapshot"
        );
        Ok(builder.create_graph_model())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact bincode encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug!(bytes = bytes.len(), "encoded graph snapshot");
        Ok(bytes)
    }

    /// Decode a snapshot written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

fn endpoint(builder: &GraphBuilder, id: &str) -> Result<Arc<GraphNode>> {
    builder
        .find_node(id)
        .cloned()
        .ok_or_else(|| DepanError::UnknownNode(id.to_string()))
}
