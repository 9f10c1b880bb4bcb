//! Relation vocabulary: interned relation kinds, relation sets, and the
//! edge matchers every traversal is driven by.

pub mod matcher;
pub mod registry;
pub mod set;

pub use matcher::{BinaryEdgeMatcher, EdgeMatcher, EmptyEdgeMatcher, ForwardEdgeMatcher, EMPTY, FORWARD};
pub use registry::{BuiltinRelation, Relation, RelationId, RelationRegistry};
pub use set::RelationSet;
