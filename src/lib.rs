//! canonical-pages - Serve pages under editor-defined canonical alias paths
//!
//! This crate provides a small page host with:
//! - Pages stored in a redb embedded database, routed by their default slug
//! - A per-page canonical alias field (literal path or capture pattern)
//! - An alias router that rebuilds an immutable route table on every alias change
//!   and publishes it atomically
//! - REST API for editing pages and aliases; any other path is dispatched to a page

pub mod api;
pub mod config;
pub mod routing;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use routing::{AliasRouter, ResolutionCache};
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub router: Arc<AliasRouter>,
    pub route_cache: Arc<ResolutionCache>,
}

impl AppState {
    /// Wire the router to the database and the dispatch cache.
    pub fn new(config: Config, db: Database) -> Self {
        let route_cache = Arc::new(ResolutionCache::new(config.routing.cache_capacity));
        let router = Arc::new(AliasRouter::new(
            Arc::new(db.clone()),
            route_cache.clone(),
            config.routing.max_alias_length,
        ));
        Self {
            config,
            db,
            router,
            route_cache,
        }
    }
}
