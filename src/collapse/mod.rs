//! Nested node collapsing: group nodes behind a master and rebuild the
//! graph as it is shown with those groups folded.

pub mod collapser;
pub mod data;

pub use collapser::Collapser;
pub use data::{CollapseData, GroupId};
