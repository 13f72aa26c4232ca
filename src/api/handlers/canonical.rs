use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::sanitize::sanitize_text_field;
use crate::storage::models::ResourceId;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CanonicalResponse {
    pub canonical: Option<String>,
    pub page_id: ResourceId,
}

#[derive(Debug, Deserialize)]
pub struct CanonicalRequest {
    /// `null` or an empty string clears the alias.
    #[serde(default)]
    pub canonical: Option<String>,
}

pub async fn get_canonical(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<JSend<CanonicalResponse>>, ApiError> {
    let id = ResourceId(id);
    state
        .db
        .get_page(id)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let canonical = state.router.alias_of(id).await?;
    Ok(JSend::success(CanonicalResponse {
        canonical,
        page_id: id,
    }))
}

/// Save the canonical alias of a page. Routes are rebuilt before this returns.
pub async fn put_canonical(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    AppJson(req): AppJson<CanonicalRequest>,
) -> Result<Json<JSend<CanonicalResponse>>, ApiError> {
    let id = ResourceId(id);
    let value = sanitize_text_field(req.canonical.as_deref().unwrap_or_default());

    let table = state.router.register_alias(id, &value).await?;

    let canonical = state.router.alias_of(id).await?;
    tracing::debug!(
        page_id = %id,
        canonical = ?canonical,
        generation = table.generation,
        "Saved canonical alias"
    );

    Ok(JSend::success(CanonicalResponse {
        canonical,
        page_id: id,
    }))
}
