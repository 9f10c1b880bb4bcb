//! Tree-shaped traversal over a successor hierarchy.
//!
//! The hierarchy is only a one-hop map and may contain cycles or nodes with
//! several parents. [`TreeModel::spanning_forest`] turns it into a proper
//! forest with a depth-first walk that keeps an explicit visited set, so
//! every node gets at most one tree parent and every walk terminates.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::successor::SuccessorEdges;
use crate::graph::{GraphModel, GraphNode};

/// Either a successor hierarchy or a flat, ungrouped node collection.
#[derive(Debug, Clone)]
pub enum TreeModel {
    Hierarchical(HashMap<String, SuccessorEdges>),
    Flat(Vec<Arc<GraphNode>>),
}

impl TreeModel {
    /// Direct successors of `id`. Flat models have none.
    pub fn successors(&self, id: &str) -> Vec<Arc<GraphNode>> {
        match self {
            TreeModel::Hierarchical(map) => map
                .get(id)
                .map(SuccessorEdges::successor_nodes)
                .unwrap_or_default(),
            TreeModel::Flat(_) => Vec::new(),
        }
    }

    /// Whether `id` has at least one successor.
    pub fn has_successors(&self, id: &str) -> bool {
        match self {
            TreeModel::Hierarchical(map) => map.contains_key(id),
            TreeModel::Flat(_) => false,
        }
    }

    /// Nodes of `graph` that are nobody's successor, in graph order. For a
    /// flat model, its own nodes.
    pub fn roots(&self, graph: &GraphModel) -> Vec<Arc<GraphNode>> {
        match self {
            TreeModel::Hierarchical(map) => {
                let mut children: HashSet<String> = HashSet::new();
                for successors in map.values() {
                    for node in successors.successor_nodes() {
                        children.insert(node.id().to_string());
                    }
                }
                graph
                    .nodes()
                    .filter(|n| !children.contains(n.id()))
                    .cloned()
                    .collect()
            }
            TreeModel::Flat(nodes) => nodes.clone(),
        }
    }

    /// `(node, tree children)` pairs of the spanning forest, bottom-up:
    /// every node comes after all of its descendants.
    pub fn walk_post_order(&self, graph: &GraphModel) -> Vec<(Arc<GraphNode>, Vec<Arc<GraphNode>>)> {
        self.spanning_forest(graph).parents_post_order()
    }

    /// Depth-first spanning forest of the nodes in `graph`.
    ///
    /// Walks start at [`roots`](Self::roots); nodes only reachable through a
    /// cycle become extra roots, taken in graph order.
    pub fn spanning_forest(&self, graph: &GraphModel) -> SpanningForest {
        let mut forest = SpanningForest::default();
        let mut visited: HashSet<String> = HashSet::new();

        let candidates: Vec<Arc<GraphNode>> = match self {
            TreeModel::Hierarchical(_) => {
                let mut all = self.roots(graph);
                all.extend(graph.nodes().cloned());
                all
            }
            TreeModel::Flat(nodes) => nodes.clone(),
        };

        for root in candidates {
            if !visited.insert(root.id().to_string()) {
                continue;
            }
            forest.roots.push(root.clone());
            self.walk_from(graph, root, &mut visited, &mut forest);
        }
        forest
    }

    fn walk_from(
        &self,
        graph: &GraphModel,
        root: Arc<GraphNode>,
        visited: &mut HashSet<String>,
        forest: &mut SpanningForest,
    ) {
        // (node, its successors, next successor to try)
        let mut stack: Vec<(Arc<GraphNode>, Vec<Arc<GraphNode>>, usize)> = Vec::new();
        let successors = self.successors(root.id());
        stack.push((root, successors, 0));

        while let Some((node, successors, next)) = stack.last_mut() {
            if *next >= successors.len() {
                forest.post_order.push(node.clone());
                stack.pop();
                continue;
            }
            let child = successors[*next].clone();
            *next += 1;

            if !graph.contains_node(child.id()) || !visited.insert(child.id().to_string()) {
                continue;
            }
            forest
                .children
                .entry(node.id().to_string())
                .or_default()
                .push(child.clone());
            let grandchildren = self.successors(child.id());
            stack.push((child, grandchildren, 0));
        }
    }
}

/// Result of [`TreeModel::spanning_forest`]: every node has at most one
/// parent.
#[derive(Debug, Clone, Default)]
pub struct SpanningForest {
    roots: Vec<Arc<GraphNode>>,
    children: HashMap<String, Vec<Arc<GraphNode>>>,
    post_order: Vec<Arc<GraphNode>>,
}

impl SpanningForest {
    pub fn roots(&self) -> &[Arc<GraphNode>] {
        &self.roots
    }

    pub fn children(&self, id: &str) -> &[Arc<GraphNode>] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes bottom-up: every node comes after all of its descendants.
    pub fn post_order(&self) -> &[Arc<GraphNode>] {
        &self.post_order
    }

    pub fn len(&self) -> usize {
        self.post_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post_order.is_empty()
    }

    /// `(node, tree children)` for every node with children, bottom-up.
    pub fn parents_post_order(&self) -> Vec<(Arc<GraphNode>, Vec<Arc<GraphNode>>)> {
        self.post_order
            .iter()
            .filter_map(|node| {
                self.children
                    .get(node.id())
                    .map(|children| (node.clone(), children.clone()))
            })
            .collect()
    }
}
