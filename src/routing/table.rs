//! Immutable route table snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pattern::{normalize_path, AliasPattern};
use crate::storage::models::ResourceId;

/// Parameters captured by a pattern match, in group order.
/// Positional groups are keyed `"1"`, `"2"`, ...; named groups appear again under their name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub resource_id: ResourceId,
    /// The alias path of the route that matched.
    pub alias_path: String,
    pub captures: Captures,
}

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub resource_id: ResourceId,
    pub alias_path: String,
    pub pattern: AliasPattern,
}

/// A fully built set of routes. Never mutated after construction; a rebuild
/// produces a new table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// 0 for the placeholder table installed before the first rebuild.
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            built_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn new(generation: u64, entries: Vec<RouteEntry>) -> Self {
        Self {
            generation,
            built_at: Utc::now(),
            entries,
        }
    }

    /// First route, in registration order, whose pattern matches the path.
    pub fn resolve(&self, request_path: &str) -> Option<Resolution> {
        let path = normalize_path(request_path);
        self.entries.iter().find_map(|entry| {
            entry.pattern.captures(path).map(|captures| Resolution {
                resource_id: entry.resource_id,
                alias_path: entry.alias_path.clone(),
                captures,
            })
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two tables route identically when they hold the same aliases in the same order.
    pub fn same_routes(&self, other: &RouteTable) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.resource_id == b.resource_id && a.alias_path == b.alias_path)
    }
}
