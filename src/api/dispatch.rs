//! Request dispatch: resolves the request path against the alias routes and
//! exposes the outcome to the page renderer as request-scoped query variables.

use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, Uri};
use axum::middleware::Next;
use axum::response::Response;
use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::routing::{Captures, Resolution};
use crate::storage::models::ResourceId;
use crate::AppState;

/// Variables handed to the page template when a request arrived via an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryVars {
    pub page_id: ResourceId,
    pub canonical_page_id: ResourceId,
    pub alias_path: String,
    pub captures: Captures,
}

impl From<Resolution> for QueryVars {
    fn from(resolution: Resolution) -> Self {
        Self {
            page_id: resolution.resource_id,
            canonical_page_id: resolution.resource_id,
            alias_path: resolution.alias_path,
            captures: resolution.captures,
        }
    }
}

impl QueryVars {
    /// Flattened `name -> value` pairs. Captures are exposed as `matches[N]`
    /// for positional groups and by name for named groups.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page_id".to_string(), self.page_id.to_string()),
            (
                "canonical_page_id".to_string(),
                self.canonical_page_id.to_string(),
            ),
        ];
        for (name, value) in self.captures.iter() {
            let key = if name.bytes().all(|b| b.is_ascii_digit()) {
                format!("matches[{name}]")
            } else {
                name.to_string()
            };
            pairs.push((key, value.to_string()));
        }
        pairs
    }
}

/// The request path with percent-escapes decoded. A path that does not decode
/// to UTF-8 is returned as sent.
pub fn decoded_path(uri: &Uri) -> Cow<'_, str> {
    let raw = uri.path();
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// Middleware in front of the page renderer. On an alias match the
/// `QueryVars` are inserted into the request extensions; otherwise the request
/// continues untouched to default slug routing.
pub async fn expose_query_vars(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        let path = decoded_path(req.uri()).into_owned();
        if let Some(resolution) = state
            .route_cache
            .resolve_with(state.router.as_ref(), &path)
        {
            tracing::debug!(
                path = %path,
                page_id = %resolution.resource_id,
                alias = %resolution.alias_path,
                "Resolved alias"
            );
            req.extensions_mut().insert(QueryVars::from(resolution));
        }
    }
    next.run(req).await
}
