//! Dependency graph model, construction and snapshots.
//!
//! Provides the immutable graph value, the builder that deduplicates nodes
//! and edges, the streaming listener protocol analyzers emit through, and
//! snapshots for persistence.

pub mod builder;
pub mod listener;
pub mod model;
pub mod persistence;
pub mod types;

pub use builder::{build_from_edges, build_from_nodes, merge, subtract, GraphBuilder};
pub use listener::{BuilderListener, DependencyListener, FilteringListener};
pub use model::GraphModel;
pub use persistence::{DependencyModel, EdgeRecord, GraphSnapshot, RelationRecord};
pub use types::{GraphEdge, GraphNode, GraphStats, NodeKind};
