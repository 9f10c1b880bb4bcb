//! Collapse group records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot of a group in the collapser's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(usize);

impl GroupId {
    pub(crate) fn new(index: usize) -> Self {
        GroupId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A set of member nodes shown behind a single master node.
///
/// Nodes are referenced by id. The master is also listed among the members.
/// A member may itself master another, nested group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseData {
    id: GroupId,
    master: String,
    members: Vec<String>,
}

impl CollapseData {
    pub(crate) fn new(id: GroupId, master: String, members: Vec<String>) -> Self {
        Self {
            id,
            master,
            members,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn master(&self) -> &str {
        &self.master
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Members other than the master.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .map(String::as_str)
            .filter(move |m| *m != self.master)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    pub(crate) fn remove_member(&mut self, id: &str) {
        self.members.retain(|m| m != id);
    }
}
