//! Core types for the dependency graph.
//!
//! Defines node kinds, nodes, edges, and the summary statistics that
//! describe a graph.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::relation::RelationId;

/// Open tag describing what a node stands for. Analyzers may introduce
/// their own kinds; display and sorting behaviour per kind lives outside
/// this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKind(Cow<'static, str>);

impl NodeKind {
    /// A directory or package.
    pub const DIRECTORY: NodeKind = NodeKind(Cow::Borrowed("directory"));
    /// A source file.
    pub const FILE: NodeKind = NodeKind(Cow::Borrowed("file"));
    /// A class, struct, interface or other type.
    pub const TYPE: NodeKind = NodeKind(Cow::Borrowed("type"));
    /// A function or method.
    pub const METHOD: NodeKind = NodeKind(Cow::Borrowed("method"));
    /// A field or variable.
    pub const FIELD: NodeKind = NodeKind(Cow::Borrowed("field"));
    /// A build artifact (library, package, binary).
    pub const ARTIFACT: NodeKind = NodeKind(Cow::Borrowed("artifact"));
    /// Anything without a more specific kind.
    pub const GENERIC: NodeKind = NodeKind(Cow::Borrowed("generic"));

    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        NodeKind(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::GENERIC
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the dependency graph.
///
/// Identity is the `id` string alone: two nodes with the same id are the
/// same logical entity no matter what else they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    id: String,
    #[serde(default)]
    kind: NodeKind,
    /// Human-readable name; defaults to the id when absent.
    #[serde(default)]
    label: Option<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl Hash for GraphNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A directed, typed edge. Equality and hashing use the
/// `(head id, tail id, relation)` triple, which is what deduplication keys on.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    head: Arc<GraphNode>,
    tail: Arc<GraphNode>,
    relation: RelationId,
}

impl GraphEdge {
    pub fn new(head: Arc<GraphNode>, tail: Arc<GraphNode>, relation: RelationId) -> Self {
        Self {
            head,
            tail,
            relation,
        }
    }

    pub fn head(&self) -> &Arc<GraphNode> {
        &self.head
    }

    pub fn tail(&self) -> &Arc<GraphNode> {
        &self.tail
    }

    pub fn relation(&self) -> RelationId {
        self.relation
    }

    pub fn is_self_loop(&self) -> bool {
        self.head.id == self.tail.id
    }

    pub(crate) fn key(&self) -> EdgeKey {
        EdgeKey {
            head: self.head.id.clone(),
            tail: self.tail.id.clone(),
            relation: self.relation,
        }
    }
}

impl PartialEq for GraphEdge {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation
            && self.head.id == other.head.id
            && self.tail.id == other.tail.id
    }
}

impl Eq for GraphEdge {}

impl Hash for GraphEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.head.id.hash(state);
        self.tail.id.hash(state);
        self.relation.hash(state);
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.head.id, self.relation, self.tail.id)
    }
}

/// Owned lookup key for the edge-triple index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EdgeKey {
    pub head: String,
    pub tail: String,
    pub relation: RelationId,
}

/// Statistics about a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Edge count per relation id.
    pub relation_counts: BTreeMap<RelationId, usize>,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges across {} relations",
            self.node_count,
            self.edge_count,
            self.relation_counts.len()
        )
    }
}
