//! Configuration loaded from `.depan/config.toml`.
//!
//! Declares which relations exist beyond the built-in catalogue and which
//! of them drive the default hierarchy. Everything has a default, so a
//! missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{DepanError, Result};
use crate::relation::{BinaryEdgeMatcher, RelationRegistry, RelationSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepanConfig {
    /// Register the built-in relation catalogue before `relations`.
    pub include_builtin_relations: bool,
    /// Extra relations, registered in order.
    pub relations: Vec<RelationConfig>,
    pub hierarchy: HierarchyConfig,
}

impl Default for DepanConfig {
    fn default() -> Self {
        Self {
            include_builtin_relations: true,
            relations: Vec::new(),
            hierarchy: HierarchyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub key: String,
    pub forward: String,
    pub reverse: String,
}

/// Relation keys followed when building the default hierarchy.
/// Both lists empty means every relation, forward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub forward: Vec<String>,
    pub reverse: Vec<String>,
}

impl DepanConfig {
    /// Load config, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Load config, reporting any read or parse failure.
    pub fn try_load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse config from toml text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DepanError::Config(e.to_string()))
    }

    /// Default location under a project root.
    pub fn default_path(root: &Path) -> std::path::PathBuf {
        root.join(".depan").join("config.toml")
    }

    /// A registry holding the builtins (if enabled) and the configured relations.
    pub fn build_registry(&self) -> Result<RelationRegistry> {
        let mut registry = RelationRegistry::new();
        if self.include_builtin_relations {
            registry.register_builtins();
        }
        for relation in &self.relations {
            registry.register(&relation.key, &relation.forward, &relation.reverse)?;
        }
        Ok(registry)
    }

    /// The matcher the hierarchy is built with, resolved through `registry`.
    pub fn hierarchy_matcher(&self, registry: &RelationRegistry) -> Result<BinaryEdgeMatcher> {
        if self.hierarchy.forward.is_empty() && self.hierarchy.reverse.is_empty() {
            return Ok(BinaryEdgeMatcher::new(RelationSet::ALL, RelationSet::EMPTY));
        }
        let resolve = |keys: &[String]| -> Result<RelationSet> {
            let ids = keys
                .iter()
                .map(|key| registry.resolve(key))
                .collect::<Result<Vec<_>>>()?;
            Ok(RelationSet::of(ids))
        };
        Ok(BinaryEdgeMatcher::new(
            resolve(&self.hierarchy.forward)?,
            resolve(&self.hierarchy.reverse)?,
        ))
    }
}
