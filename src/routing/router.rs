//! The alias router: owns the published route table and keeps it in step
//! with the alias fields held by the resource store.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use super::cache::RouteCache;
use super::pattern::{normalize_path, AliasPattern, PatternError};
use super::store::{ResourceStore, StoreError};
use super::table::{Resolution, RouteEntry, RouteTable};
use crate::storage::models::{AliasEntry, ResourceId};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Invalid alias path '{alias}': {reason}")]
    InvalidAliasPath { alias: String, reason: PatternError },
    #[error("Alias path '{alias}' is already used by resource {owner}")]
    AliasConflict { alias: String, owner: ResourceId },
    #[error("Resource {0} not found")]
    ResourceNotFound(ResourceId),
}

/// Path lookup capability consumed by the request dispatch layer.
pub trait Resolver: Send + Sync {
    fn resolve(&self, request_path: &str) -> Option<Resolution>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterState {
    /// No rebuild has succeeded yet.
    Stale,
    Active,
}

pub struct AliasRouter {
    store: Arc<dyn ResourceStore>,
    cache: Arc<dyn RouteCache>,
    table: ArcSwap<RouteTable>,
    /// Serializes writers so an older snapshot is never published over a newer one.
    write_lock: Mutex<()>,
    max_alias_len: usize,
}

impl AliasRouter {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        cache: Arc<dyn RouteCache>,
        max_alias_len: usize,
    ) -> Self {
        Self {
            store,
            cache,
            table: ArcSwap::from_pointee(RouteTable::empty()),
            write_lock: Mutex::new(()),
            max_alias_len,
        }
    }

    pub fn state(&self) -> RouterState {
        if self.table.load().generation == 0 {
            RouterState::Stale
        } else {
            RouterState::Active
        }
    }

    /// The currently published table.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Rebuild the route table from the store and publish it.
    /// On failure the previously published table stays in effect.
    pub async fn rebuild_routes(&self) -> Result<Arc<RouteTable>, RouterError> {
        let _guard = self.write_lock.lock().await;
        self.rebuild_locked().await
    }

    async fn rebuild_locked(&self) -> Result<Arc<RouteTable>, RouterError> {
        let entries = self.store.list_alias_entries().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load alias entries, keeping current routes");
            RouterError::StoreUnavailable(e)
        })?;

        let generation = self.table.load().generation + 1;
        let table = Arc::new(RouteTable::new(generation, self.compile_entries(entries)));

        self.table.store(Arc::clone(&table));
        self.cache.flush();

        tracing::info!(generation, routes = table.len(), "Published route table");
        Ok(table)
    }

    /// Compile stored entries, keeping registration order. Rows that no longer
    /// compile (e.g. written before a validation rule existed) are skipped.
    fn compile_entries(&self, entries: Vec<AliasEntry>) -> Vec<RouteEntry> {
        entries
            .into_iter()
            .filter(AliasEntry::is_active)
            .filter_map(|entry| {
                match AliasPattern::compile(&entry.alias_path, self.max_alias_len) {
                    Ok(pattern) => Some(RouteEntry {
                        resource_id: entry.resource_id,
                        alias_path: entry.alias_path,
                        pattern,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            resource_id = %entry.resource_id,
                            alias = %entry.alias_path,
                            error = %e,
                            "Skipping invalid stored alias"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Persist a resource's alias (empty clears it) and rebuild before returning,
    /// so the change is visible to the next request.
    pub async fn register_alias(
        &self,
        resource_id: ResourceId,
        alias_path: &str,
    ) -> Result<Arc<RouteTable>, RouterError> {
        let alias = normalize_path(alias_path);
        if !alias.is_empty() {
            AliasPattern::compile(alias, self.max_alias_len).map_err(|reason| {
                RouterError::InvalidAliasPath {
                    alias: alias.to_string(),
                    reason,
                }
            })?;
        }

        let _guard = self.write_lock.lock().await;

        if !alias.is_empty() {
            let existing = self.store.list_alias_entries().await?;
            if let Some(owner) = existing
                .iter()
                .find(|e| e.resource_id != resource_id && normalize_path(&e.alias_path) == alias)
            {
                return Err(RouterError::AliasConflict {
                    alias: alias.to_string(),
                    owner: owner.resource_id,
                });
            }
        }

        if !self.store.set_alias_field(resource_id, alias).await? {
            return Err(RouterError::ResourceNotFound(resource_id));
        }
        tracing::debug!(resource_id = %resource_id, alias = %alias, "Stored alias");

        self.rebuild_locked().await
    }

    /// Current alias field of a resource.
    pub async fn alias_of(&self, resource_id: ResourceId) -> Result<Option<String>, RouterError> {
        Ok(self.store.get_alias_field(resource_id).await?)
    }
}

impl Resolver for AliasRouter {
    fn resolve(&self, request_path: &str) -> Option<Resolution> {
        self.table.load().resolve(request_path)
    }
}
