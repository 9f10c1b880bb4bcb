//! Streaming construction protocol for analyzers.
//!
//! Analyzers report what they discover through a [`DependencyListener`]
//! instead of touching a builder directly. [`FilteringListener`] sits in
//! front of another listener and rejects unwanted dependencies before they
//! reach node deduplication.

use std::sync::Arc;

use super::builder::GraphBuilder;
use super::types::GraphNode;
use crate::relation::RelationId;

pub trait DependencyListener {
    fn new_node(&mut self, node: Arc<GraphNode>);

    fn new_dep(&mut self, parent: Arc<GraphNode>, child: Arc<GraphNode>, relation: RelationId);

    fn new_deps(&mut self, parent: Arc<GraphNode>, children: Vec<Arc<GraphNode>>, relation: RelationId) {
        for child in children {
            self.new_dep(parent.clone(), child, relation);
        }
    }
}

/// Feeds everything it hears into a [`GraphBuilder`] through `map_node`.
#[derive(Debug)]
pub struct BuilderListener<'b> {
    builder: &'b mut GraphBuilder,
}

impl<'b> BuilderListener<'b> {
    pub fn new(builder: &'b mut GraphBuilder) -> Self {
        Self { builder }
    }
}

impl DependencyListener for BuilderListener<'_> {
    fn new_node(&mut self, node: Arc<GraphNode>) {
        self.builder.map_node(node);
    }

    fn new_dep(&mut self, parent: Arc<GraphNode>, child: Arc<GraphNode>, relation: RelationId) {
        self.builder.add_dependency(parent, child, relation);
    }
}

/// Drops nodes and dependencies whose endpoints fail `accept`.
pub struct FilteringListener<L, F> {
    inner: L,
    accept: F,
    dropped: usize,
}

impl<L, F> FilteringListener<L, F>
where
    L: DependencyListener,
    F: Fn(&GraphNode) -> bool,
{
    pub fn new(inner: L, accept: F) -> Self {
        Self {
            inner,
            accept,
            dropped: 0,
        }
    }

    /// Number of nodes and dependencies rejected so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L, F> DependencyListener for FilteringListener<L, F>
where
    L: DependencyListener,
    F: Fn(&GraphNode) -> bool,
{
    fn new_node(&mut self, node: Arc<GraphNode>) {
        if (self.accept)(&node) {
            self.inner.new_node(node);
        } else {
            self.dropped += 1;
        }
    }

    fn new_dep(&mut self, parent: Arc<GraphNode>, child: Arc<GraphNode>, relation: RelationId) {
        if (self.accept)(&parent) && (self.accept)(&child) {
            self.inner.new_dep(parent, child, relation);
        } else {
            self.dropped += 1;
        }
    }

    fn new_deps(&mut self, parent: Arc<GraphNode>, children: Vec<Arc<GraphNode>>, relation: RelationId) {
        if !(self.accept)(&parent) {
            self.dropped += children.len();
            return;
        }
        let before = children.len();
        let kept: Vec<Arc<GraphNode>> = children.into_iter().filter(|c| (self.accept)(c)).collect();
        self.dropped += before - kept.len();
        self.inner.new_deps(parent, kept, relation);
    }
}
