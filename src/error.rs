//! Error types for depan.

use thiserror::Error;

/// Errors raised by graph construction, relation lookup and collapsing.
///
/// All of these are contract violations reported synchronously to the
/// immediate caller. Nothing is retried.
#[derive(Debug, Error)]
pub enum DepanError {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("node {0} is not the master of an active collapse group")]
    NotAGroupMaster(String),

    #[error("collapse master {0} is not among the picked nodes")]
    MasterNotPicked(String),

    #[error("collapsing {member} under {master} would make a group contain itself")]
    CollapseCycle { master: String, member: String },

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    #[error("relation {key} is already registered with different names")]
    RelationConflict { key: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, DepanError>;
