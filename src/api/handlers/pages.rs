use axum::extract::{Path, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, AppQuery, JSend, Paginated, Pagination};
use crate::api::sanitize::sanitize_text_field;
use crate::routing::pattern::{normalize_path, AliasPattern, RESERVED_PREFIXES};
use crate::storage::models::{PageRecord, ResourceId};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub body: String,
    pub canonical: Option<String>,
    pub created_at: String,
    pub id: ResourceId,
    pub slug: String,
    pub title: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub canonical: Option<String>,
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePageRequest {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub canonical: Option<Option<String>>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPagesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

/// Distinguishes between a missing field (`None`) and an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_page(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreatePageRequest>,
) -> Result<Json<JSend<PageResponse>>, ApiError> {
    let title = sanitize_text_field(&req.title);
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    let slug = validate_slug(&req.slug)?;

    if state.db.slug_exists(&slug)? {
        return Err(ApiError::conflict(format!("slug '{slug}' is already in use")));
    }

    // Reject a bad alias before anything is written
    let canonical = req
        .canonical
        .as_deref()
        .map(sanitize_text_field)
        .filter(|c| !c.is_empty());
    if let Some(ref alias) = canonical {
        AliasPattern::compile(alias, state.config.routing.max_alias_length)
            .map_err(|e| ApiError::bad_request(format!("Invalid alias path '{alias}': {e}")))?;
    }

    let page = state.db.create_page(&title, &slug, &req.body)?;

    if let Some(ref alias) = canonical {
        if let Err(e) = state.router.register_alias(page.id, alias).await {
            // Best-effort rollback of the page we just created
            if let Err(cleanup) = state.db.delete_page(page.id) {
                tracing::warn!(page_id = %page.id, error = %cleanup, "Failed to roll back page");
            }
            return Err(e.into());
        }
    }

    tracing::debug!(page_id = %page.id, slug = %slug, "Created page");

    Ok(JSend::success(page_to_response(&page, canonical)))
}

pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<JSend<PageResponse>>, ApiError> {
    let page = state
        .db
        .get_page(ResourceId(id))?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let canonical = state.router.alias_of(page.id).await?;
    Ok(JSend::success(page_to_response(&page, canonical)))
}

/// Save a page. A present `canonical` field goes through the alias router, so
/// the new alias is routable as soon as this returns.
pub async fn update_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    AppJson(req): AppJson<UpdatePageRequest>,
) -> Result<Json<JSend<PageResponse>>, ApiError> {
    let id = ResourceId(id);

    if req.body.is_none() && req.canonical.is_none() && req.slug.is_none() && req.title.is_none()
    {
        return Err(ApiError::bad_request(
            "at least one field (body, canonical, slug, title) must be provided",
        ));
    }

    let existing = state
        .db
        .get_page(id)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let title = match req.title {
        Some(ref t) => {
            let t = sanitize_text_field(t);
            if t.is_empty() {
                return Err(ApiError::bad_request("title must not be empty"));
            }
            Some(t)
        }
        None => None,
    };

    // If changing slug, check uniqueness (allow keeping the same slug)
    let slug = match req.slug {
        Some(ref s) => {
            let s = validate_slug(s)?;
            if s != existing.slug && state.db.slug_exists(&s)? {
                return Err(ApiError::conflict(format!("slug '{s}' is already in use")));
            }
            Some(s)
        }
        None => None,
    };

    if let Some(ref canonical) = req.canonical {
        let value = sanitize_text_field(canonical.as_deref().unwrap_or_default());
        state.router.register_alias(id, &value).await?;
    }

    let page = state
        .db
        .update_page(id, title.as_deref(), slug.as_deref(), req.body.as_deref())?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let canonical = state.router.alias_of(id).await?;

    tracing::debug!(page_id = %id, "Updated page");
    Ok(JSend::success(page_to_response(&page, canonical)))
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<JSend<()>>, ApiError> {
    let id = ResourceId(id);
    let deleted = state.db.delete_page(id)?;
    if !deleted {
        return Err(ApiError::not_found("Page not found"));
    }

    // The page is gone either way; a failed rebuild leaves a dangling route that renders 404
    if let Err(e) = state.router.rebuild_routes().await {
        tracing::warn!(page_id = %id, error = %e, "Failed to prune alias after page delete");
    }

    tracing::debug!(page_id = %id, "Deleted page");
    Ok(JSend::success(()))
}

pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListPagesParams>,
) -> Result<Json<JSend<Paginated<PageResponse>>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let pages = state.db.list_pages()?;

    let total = pages.len() as u64;
    let mut items = Vec::new();
    for page in pages
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
    {
        let canonical = state.router.alias_of(page.id).await?;
        items.push(page_to_response(page, canonical));
    }

    Ok(JSend::page(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_slug(raw: &str) -> Result<String, ApiError> {
    let slug = normalize_path(raw);
    if slug.is_empty() {
        return Err(ApiError::bad_request("slug must not be empty"));
    }
    if slug.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ApiError::bad_request(
            "slug must not contain whitespace or control characters",
        ));
    }
    let first_segment = slug.split('/').next().unwrap_or_default();
    if RESERVED_PREFIXES.contains(&first_segment) {
        return Err(ApiError::bad_request(format!(
            "slug must not start with reserved segment '{first_segment}'"
        )));
    }
    Ok(slug.to_string())
}

fn page_to_response(page: &PageRecord, canonical: Option<String>) -> PageResponse {
    PageResponse {
        body: page.body.clone(),
        canonical,
        created_at: page.created_at.to_rfc3339(),
        id: page.id,
        slug: page.slug.clone(),
        title: page.title.clone(),
        updated_at: page.updated_at.to_rfc3339(),
    }
}
