use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a page, allocated from a monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        ResourceId(id)
    }
}

/// A page record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: ResourceId,
    pub title: String,
    /// Default path the host routes to this page when no alias matches.
    pub slug: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The persisted canonical alias field of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasRecord {
    pub alias_path: String,
    /// Registration sequence. Assigned on first save and kept across overwrites,
    /// so it defines the order routes are evaluated in.
    pub seq: u64,
    pub updated_at: DateTime<Utc>,
}

/// One (resource, alias) pair as handed to the route table builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasEntry {
    pub resource_id: ResourceId,
    pub alias_path: String,
}

impl AliasEntry {
    pub fn new(resource_id: ResourceId, alias_path: impl Into<String>) -> Self {
        Self {
            resource_id,
            alias_path: alias_path.into(),
        }
    }

    /// Only non-empty aliases take part in routing.
    pub fn is_active(&self) -> bool {
        !self.alias_path.trim().is_empty()
    }
}
