//! # depan
//!
//! Dependency graph model and collapse engine.
//!
//! Analyzers emit nodes and typed edges through a [`GraphBuilder`] (or a
//! [`DependencyListener`]), which deduplicates them into an immutable
//! [`GraphModel`]. Edges are classified by [`EdgeMatcher`]s built from
//! interned relations, a one-hop successor hierarchy is derived from them,
//! and a [`Collapser`] folds groups of nodes behind a single master to give
//! a simplified "exposed" view of the graph.
//!
//! ## Quick Start
//!
//! ```rust
//! use depan::{
//!     compute_spanning_hierarchy, BuiltinRelation, Collapser, GraphBuilder, GraphNode,
//!     NodeKind, RelationRegistry, TreeModel, FORWARD,
//! };
//!
//! let mut relations = RelationRegistry::with_builtins();
//! let contains = relations.builtin(BuiltinRelation::Contains);
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_dependency(
//!     GraphNode::new("src", NodeKind::DIRECTORY),
//!     GraphNode::new("src/lib.rs", NodeKind::FILE),
//!     contains,
//! );
//! let graph = builder.create_graph_model();
//!
//! let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &FORWARD));
//! let mut collapser = Collapser::new();
//! collapser.collapse_tree(&graph, &tree)?;
//!
//! let exposed = collapser.build_exposed_graph(&graph)?;
//! assert_eq!(exposed.node_count(), 1);
//! # Ok::<(), depan::DepanError>(())
//! ```

pub mod collapse;
pub mod config;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod relation;

// Re-exports for convenience
pub use error::{DepanError, Result};

pub use collapse::{CollapseData, Collapser, GroupId};
pub use config::DepanConfig;
pub use graph::{
    build_from_edges, build_from_nodes, merge, subtract, BuilderListener, DependencyListener,
    DependencyModel, FilteringListener, GraphBuilder, GraphEdge, GraphModel, GraphNode,
    GraphSnapshot, GraphStats, NodeKind,
};
pub use hierarchy::{compute_spanning_hierarchy, SpanningForest, SuccessorEdges, TreeModel};
pub use relation::{
    BinaryEdgeMatcher, BuiltinRelation, EdgeMatcher, EmptyEdgeMatcher, ForwardEdgeMatcher, Relation,
    RelationId, RelationRegistry, RelationSet, EMPTY, FORWARD,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Emit a small project layout the way an analyzer would.
    fn analyze(listener: &mut impl DependencyListener, registry: &mut RelationRegistry) {
        let contains = registry.builtin(BuiltinRelation::Contains);
        let calls = registry.builtin(BuiltinRelation::Calls);
        let node = |id: &str, kind: NodeKind| Arc::new(GraphNode::new(id, kind));

        let root = node("src", NodeKind::DIRECTORY);
        let auth = node("src/auth.rs", NodeKind::FILE);
        let main = node("src/main.rs", NodeKind::FILE);
        listener.new_node(root.clone());
        listener.new_deps(root, vec![auth.clone(), main.clone()], contains);

        let login = node("src/auth.rs#login", NodeKind::METHOD);
        let validate = node("src/auth.rs#validate", NodeKind::METHOD);
        let entry = node("src/main.rs#main", NodeKind::METHOD);
        listener.new_deps(auth, vec![login.clone(), validate.clone()], contains);
        listener.new_dep(main, entry.clone(), contains);

        listener.new_dep(entry, login.clone(), calls);
        listener.new_dep(login.clone(), validate, calls);
        listener.new_dep(login.clone(), login, calls);
    }

    fn project() -> (GraphModel, RelationRegistry) {
        let mut registry = RelationRegistry::with_builtins();
        let mut builder = GraphBuilder::new();
        analyze(&mut BuilderListener::new(&mut builder), &mut registry);
        (builder.create_graph_model(), registry)
    }

    #[test]
    fn test_containment_collapse_end_to_end() {
        let (graph, mut registry) = project();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 8);

        let contains = registry.builtin(BuiltinRelation::Contains);
        let matcher = ForwardEdgeMatcher::new(RelationSet::single(contains));
        let tree = TreeModel::Hierarchical(compute_spanning_hierarchy(&graph, &matcher));
        assert_eq!(tree.roots(&graph).len(), 1);

        let mut collapser = Collapser::new();
        let created = collapser.collapse_tree(&graph, &tree).unwrap();
        let masters: Vec<&str> = created.iter().map(CollapseData::master).collect();
        assert_eq!(masters, vec!["src/auth.rs", "src/main.rs", "src"]);

        let exposed = collapser.build_exposed_graph(&graph).unwrap();
        assert_eq!(exposed.node_count(), 1);
        assert_eq!(exposed.edge_count(), 0);

        // Open the directory: the two files remain, main calls into auth.
        collapser.uncollapse("src").unwrap();
        let exposed = collapser.build_exposed_graph(&graph).unwrap();
        let ids: Vec<&str> = exposed.nodes().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["src", "src/auth.rs", "src/main.rs"]);
        let calls = registry.builtin(BuiltinRelation::Calls);
        assert!(exposed.find_edge("src/main.rs", "src/auth.rs", calls).is_some());
        assert_eq!(exposed.edge_count(), 3);
    }

    #[test]
    fn test_snapshot_survives_fresh_registry() {
        let (graph, registry) = project();
        let snapshot = GraphSnapshot::capture(&graph, &registry, DependencyModel::default()).unwrap();
        let json = snapshot.to_json().unwrap();

        let config = DepanConfig::from_toml("[hierarchy]\nforward = [\"contains\"]\n").unwrap();
        let mut fresh = config.build_registry().unwrap();
        let restored = GraphSnapshot::from_json(&json).unwrap().restore(&mut fresh).unwrap();
        assert_eq!(restored.stats().node_count, graph.node_count());
        assert_eq!(restored.edge_count(), graph.edge_count());

        let matcher = config.hierarchy_matcher(&fresh).unwrap();
        let hierarchy = compute_spanning_hierarchy(&restored, &matcher);
        assert_eq!(hierarchy.len(), 3);
        assert_eq!(hierarchy["src/auth.rs"].successor_nodes().len(), 2);
    }

    #[test]
    fn test_filtered_analysis_and_subgraph() {
        let mut registry = RelationRegistry::with_builtins();
        let mut builder = GraphBuilder::new();
        {
            let mut listener = FilteringListener::new(BuilderListener::new(&mut builder), |n: &GraphNode| {
                n.kind() != &NodeKind::METHOD
            });
            analyze(&mut listener, &mut registry);
        }
        let graph = builder.create_graph_model();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let files: Vec<Arc<GraphNode>> = graph
            .nodes()
            .filter(|n| n.kind() == &NodeKind::FILE)
            .cloned()
            .collect();
        let sub = build_from_nodes(&graph, &files);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 0);
    }
}
