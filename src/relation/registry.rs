//! Relation interning.
//!
//! Every edge of the same kind must point at the same relation. Instead of
//! relying on object identity, relations are registered once in a
//! [`RelationRegistry`] under a stable string key and referenced everywhere
//! else by the [`RelationId`] the registry hands out. A graph reloaded from
//! disk re-interns its relations by key, so it ends up with the very same ids
//! as the live code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::error::{DepanError, Result};

/// Interned handle for a [`Relation`]. Only meaningful together with the
/// registry that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(u32);

impl RelationId {
    /// Position in the registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A directed relationship kind, named in both directions
/// (e.g. `calls` / `called by`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    id: RelationId,
    key: String,
    forward_name: String,
    reverse_name: String,
}

impl Relation {
    pub fn id(&self) -> RelationId {
        self.id
    }

    /// Stable key the relation is interned under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn forward_name(&self) -> &str {
        &self.forward_name
    }

    pub fn reverse_name(&self) -> &str {
        &self.reverse_name
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.forward_name)
    }
}

/// Relations every analyzer can rely on being available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinRelation {
    /// A container holds an element (directory -> file, class -> method).
    Contains,
    /// File defines a symbol.
    Defines,
    /// Symbol calls another symbol.
    Calls,
    /// File imports another file or module.
    Imports,
    /// Symbol uses a type.
    UsesType,
    /// Type implements an interface or trait.
    Implements,
    /// Type extends another type.
    Extends,
    /// File exports a symbol.
    Exports,
    /// Generic reference between symbols.
    References,
    /// Parameter type relationship.
    Parameter,
    /// Return type relationship.
    Returns,
}

impl BuiltinRelation {
    pub const ALL: [BuiltinRelation; 11] = [
        BuiltinRelation::Contains,
        BuiltinRelation::Defines,
        BuiltinRelation::Calls,
        BuiltinRelation::Imports,
        BuiltinRelation::UsesType,
        BuiltinRelation::Implements,
        BuiltinRelation::Extends,
        BuiltinRelation::Exports,
        BuiltinRelation::References,
        BuiltinRelation::Parameter,
        BuiltinRelation::Returns,
    ];

    /// Key this builtin is registered under.
    pub fn key(self) -> &'static str {
        match self {
            BuiltinRelation::Contains => "contains",
            BuiltinRelation::Defines => "defines",
            BuiltinRelation::Calls => "calls",
            BuiltinRelation::Imports => "imports",
            BuiltinRelation::UsesType => "uses_type",
            BuiltinRelation::Implements => "implements",
            BuiltinRelation::Extends => "extends",
            BuiltinRelation::Exports => "exports",
            BuiltinRelation::References => "references",
            BuiltinRelation::Parameter => "parameter",
            BuiltinRelation::Returns => "returns",
        }
    }

    pub fn forward_name(self) -> &'static str {
        match self {
            BuiltinRelation::Contains => "contains",
            BuiltinRelation::Defines => "defines",
            BuiltinRelation::Calls => "calls",
            BuiltinRelation::Imports => "imports",
            BuiltinRelation::UsesType => "uses type",
            BuiltinRelation::Implements => "implements",
            BuiltinRelation::Extends => "extends",
            BuiltinRelation::Exports => "exports",
            BuiltinRelation::References => "references",
            BuiltinRelation::Parameter => "takes parameter",
            BuiltinRelation::Returns => "returns",
        }
    }

    pub fn reverse_name(self) -> &'static str {
        match self {
            BuiltinRelation::Contains => "contained in",
            BuiltinRelation::Defines => "defined in",
            BuiltinRelation::Calls => "called by",
            BuiltinRelation::Imports => "imported by",
            BuiltinRelation::UsesType => "type used by",
            BuiltinRelation::Implements => "implemented by",
            BuiltinRelation::Extends => "extended by",
            BuiltinRelation::Exports => "exported by",
            BuiltinRelation::References => "referenced by",
            BuiltinRelation::Parameter => "parameter of",
            BuiltinRelation::Returns => "returned by",
        }
    }
}

impl fmt::Display for BuiltinRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Interning table for relations. Passed explicitly into construction and
/// hierarchy code; there is no process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: Vec<Relation>,
    by_key: HashMap<String, RelationId>,
}

impl RelationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with every [`BuiltinRelation`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register a relation, or return the existing id if `key` is already
    /// registered with the same names.
    pub fn register(&mut self, key: &str, forward_name: &str, reverse_name: &str) -> Result<RelationId> {
        if let Some(&id) = self.by_key.get(key) {
            let existing = &self.relations[id.index()];
            if existing.forward_name != forward_name || existing.reverse_name != reverse_name {
                return Err(DepanError::RelationConflict {
                    key: key.to_string(),
                });
            }
            return Ok(id);
        }

        Ok(self.insert(key, forward_name, reverse_name))
    }

    /// Register every [`BuiltinRelation`] not yet present.
    pub fn register_builtins(&mut self) {
        for builtin in BuiltinRelation::ALL {
            self.intern_builtin(builtin);
        }
    }

    /// Id of a builtin relation, registering it on first use.
    pub fn builtin(&mut self, builtin: BuiltinRelation) -> RelationId {
        self.intern_builtin(builtin)
    }

    fn intern_builtin(&mut self, builtin: BuiltinRelation) -> RelationId {
        match self.by_key.get(builtin.key()) {
            Some(&id) => id,
            None => self.insert(builtin.key(), builtin.forward_name(), builtin.reverse_name()),
        }
    }

    /// Append a relation whose key is not registered yet.
    fn insert(&mut self, key: &str, forward_name: &str, reverse_name: &str) -> RelationId {
        let id = RelationId(self.relations.len() as u32);
        self.relations.push(Relation {
            id,
            key: key.to_string(),
            forward_name: forward_name.to_string(),
            reverse_name: reverse_name.to_string(),
        });
        self.by_key.insert(key.to_string(), id);
        debug!(key, %id, "registered relation");
        id
    }

    /// Id registered for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<RelationId> {
        self.by_key.get(key).copied()
    }

    /// Like [`lookup`](Self::lookup), but unknown keys are an error.
    pub fn resolve(&self, key: &str) -> Result<RelationId> {
        self.lookup(key)
            .ok_or_else(|| DepanError::UnknownRelation(key.to_string()))
    }

    /// The relation behind `id`, if it was registered here.
    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id.index())
    }

    /// Registered relations in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Registered ids in order.
    pub fn ids(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.iter().map(|r| r.id)
    }

    /// Number of registered relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
