//! Direction-aware edge predicates.
//!
//! An [`EdgeMatcher`] decides, per relation, whether an edge may be followed
//! from head to tail (forward) or from tail to head (reverse). The hierarchy
//! code follows both, which is how one function serves "what do I depend on"
//! and "what depends on me".

use super::registry::RelationId;
use super::set::RelationSet;
use crate::graph::GraphEdge;

pub trait EdgeMatcher {
    fn relation_forward(&self, relation: RelationId) -> bool;

    fn relation_reverse(&self, relation: RelationId) -> bool;

    /// Endpoint-aware forward test. The built-in matchers ignore endpoints.
    fn edge_forward(&self, edge: &GraphEdge) -> bool {
        self.relation_forward(edge.relation())
    }

    fn edge_reverse(&self, edge: &GraphEdge) -> bool {
        self.relation_reverse(edge.relation())
    }
}

impl<M: EdgeMatcher + ?Sized> EdgeMatcher for &M {
    fn relation_forward(&self, relation: RelationId) -> bool {
        (**self).relation_forward(relation)
    }

    fn relation_reverse(&self, relation: RelationId) -> bool {
        (**self).relation_reverse(relation)
    }

    fn edge_forward(&self, edge: &GraphEdge) -> bool {
        (**self).edge_forward(edge)
    }

    fn edge_reverse(&self, edge: &GraphEdge) -> bool {
        (**self).edge_reverse(edge)
    }
}

impl<M: EdgeMatcher + ?Sized> EdgeMatcher for Box<M> {
    fn relation_forward(&self, relation: RelationId) -> bool {
        (**self).relation_forward(relation)
    }

    fn relation_reverse(&self, relation: RelationId) -> bool {
        (**self).relation_reverse(relation)
    }

    fn edge_forward(&self, edge: &GraphEdge) -> bool {
        (**self).edge_forward(edge)
    }

    fn edge_reverse(&self, edge: &GraphEdge) -> bool {
        (**self).edge_reverse(edge)
    }
}

/// Matches nothing in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEdgeMatcher;

pub const EMPTY: EmptyEdgeMatcher = EmptyEdgeMatcher;

impl EdgeMatcher for EmptyEdgeMatcher {
    fn relation_forward(&self, _relation: RelationId) -> bool {
        false
    }

    fn relation_reverse(&self, _relation: RelationId) -> bool {
        false
    }
}

/// Relations in the set match forward only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardEdgeMatcher {
    relations: RelationSet,
}

/// Every relation matches forward.
pub const FORWARD: ForwardEdgeMatcher = ForwardEdgeMatcher::new(RelationSet::ALL);

impl ForwardEdgeMatcher {
    pub const fn new(relations: RelationSet) -> Self {
        Self { relations }
    }

    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }
}

impl EdgeMatcher for ForwardEdgeMatcher {
    fn relation_forward(&self, relation: RelationId) -> bool {
        self.relations.contains(relation)
    }

    fn relation_reverse(&self, _relation: RelationId) -> bool {
        false
    }
}

/// Independent relation sets per direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BinaryEdgeMatcher {
    forward: RelationSet,
    reverse: RelationSet,
}

impl BinaryEdgeMatcher {
    pub fn new(forward: RelationSet, reverse: RelationSet) -> Self {
        Self { forward, reverse }
    }

    pub fn forward(&self) -> &RelationSet {
        &self.forward
    }

    pub fn reverse(&self) -> &RelationSet {
        &self.reverse
    }
}

impl EdgeMatcher for BinaryEdgeMatcher {
    fn relation_forward(&self, relation: RelationId) -> bool {
        self.forward.contains(relation)
    }

    fn relation_reverse(&self, relation: RelationId) -> bool {
        self.reverse.contains(relation)
    }
}
