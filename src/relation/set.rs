//! Membership predicates over interned relations.

use std::collections::HashSet;

use super::registry::RelationId;

/// A predicate selecting a subset of relations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelationSet {
    /// Matches nothing.
    #[default]
    Empty,
    /// Matches every relation.
    All,
    Single(RelationId),
    Set(HashSet<RelationId>),
    Union(Vec<RelationSet>),
}

impl RelationSet {
    pub const EMPTY: RelationSet = RelationSet::Empty;
    pub const ALL: RelationSet = RelationSet::All;

    pub fn single(relation: RelationId) -> Self {
        RelationSet::Single(relation)
    }

    pub fn of<I>(relations: I) -> Self
    where
        I: IntoIterator<Item = RelationId>,
    {
        let set: HashSet<RelationId> = relations.into_iter().collect();
        match set.len() {
            0 => RelationSet::Empty,
            _ => RelationSet::Set(set),
        }
    }

    pub fn union(a: RelationSet, b: RelationSet) -> Self {
        match (a, b) {
            (RelationSet::Empty, other) | (other, RelationSet::Empty) => other,
            (RelationSet::All, _) | (_, RelationSet::All) => RelationSet::All,
            (RelationSet::Union(mut left), RelationSet::Union(right)) => {
                left.extend(right);
                RelationSet::Union(left)
            }
            (RelationSet::Union(mut left), other) | (other, RelationSet::Union(mut left)) => {
                left.push(other);
                RelationSet::Union(left)
            }
            (a, b) => RelationSet::Union(vec![a, b]),
        }
    }

    pub fn contains(&self, relation: RelationId) -> bool {
        match self {
            RelationSet::Empty => false,
            RelationSet::All => true,
            RelationSet::Single(r) => *r == relation,
            RelationSet::Set(set) => set.contains(&relation),
            RelationSet::Union(sets) => sets.iter().any(|s| s.contains(relation)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RelationSet::Empty => true,
            RelationSet::All | RelationSet::Single(_) => false,
            RelationSet::Set(set) => set.is_empty(),
            RelationSet::Union(sets) => sets.iter().all(RelationSet::is_empty),
        }
    }
}

impl FromIterator<RelationId> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationId>>(iter: I) -> Self {
        RelationSet::of(iter)
    }
}
