//! Relation names and identity namespaces

use serde::{Deserialize, Serialize};

/// Name of a user-scoped list of record references ("agents", "toolbox")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationName(String);

impl RelationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn agents() -> Self {
        Self::new("agents")
    }

    pub fn toolbox() -> Self {
        Self::new("toolbox")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity-scoped key space: `~<public key>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn for_public_key(public_key: &str) -> Self {
        Self(format!("~{}", public_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
