//! Successor hierarchies and the tree view built over them.

pub mod successor;
pub mod tree;

pub use successor::{compute_spanning_hierarchy, SuccessorEdges};
pub use tree::{SpanningForest, TreeModel};
