use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::routing::{RouteTable, RouterState};
use crate::storage::models::ResourceId;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub router: RouterState,
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub alias_path: String,
    pub literal: bool,
    pub resource_id: ResourceId,
}

#[derive(Debug, Serialize)]
pub struct RouteTableResponse {
    pub built_at: String,
    pub generation: u64,
    pub routes: Vec<RouteResponse>,
    pub state: RouterState,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub aliases_deleted: u64,
    pub pages_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        router: state.router.state(),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn route_table(State(state): State<Arc<AppState>>) -> Json<JSend<RouteTableResponse>> {
    let table = state.router.snapshot();
    JSend::success(table_to_response(&table, state.router.state()))
}

/// Rebuild routes from the store on demand (e.g. after a failed startup rebuild).
pub async fn rebuild_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<RouteTableResponse>>, ApiError> {
    let table = state.router.rebuild_routes().await?;

    Ok(JSend::success(table_to_response(&table, state.router.state())))
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.db.purge_all()?;

    tracing::warn!(
        pages = stats.pages,
        aliases = stats.aliases,
        "Purged all data"
    );

    state.router.rebuild_routes().await?;

    Ok(JSend::success(PurgeResponse {
        aliases_deleted: stats.aliases,
        pages_deleted: stats.pages,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn table_to_response(table: &RouteTable, state: RouterState) -> RouteTableResponse {
    RouteTableResponse {
        built_at: table.built_at.to_rfc3339(),
        generation: table.generation,
        routes: table
            .entries()
            .iter()
            .map(|entry| RouteResponse {
                alias_path: entry.alias_path.clone(),
                literal: entry.pattern.is_literal(),
                resource_id: entry.resource_id,
            })
            .collect(),
        state,
    }
}
