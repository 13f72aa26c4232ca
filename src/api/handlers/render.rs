use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;

use crate::api::dispatch::{decoded_path, QueryVars};
use crate::api::response::ApiError;
use crate::routing::pattern::normalize_path;
use crate::storage::models::PageRecord;
use crate::AppState;

const CANONICAL_PAGE_ID: HeaderName = HeaderName::from_static("x-canonical-page-id");

/// Characters escaped in a URL path segment, plus non-ASCII.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Render a page. Route: any path not claimed by the API.
///
/// Requests that arrived through an alias carry `QueryVars`; everything else
/// falls through to slug routing.
pub async fn serve_page(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    query_vars: Option<Extension<QueryVars>>,
) -> Result<Response, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::method_not_allowed("Method not allowed"));
    }

    let page = match query_vars {
        Some(Extension(ref vars)) => state.db.get_page(vars.page_id)?,
        None => state
            .db
            .get_page_by_slug(normalize_path(&decoded_path(&uri)))?,
    }
    .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let vars = query_vars.map(|Extension(vars)| vars);
    let html = render_html(&page, vars.as_ref());

    let mut response = (StatusCode::OK, html).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    if let Ok(value) = format!("<{}>; rel=\"canonical\"", canonical_href(&page.slug)).parse() {
        headers.insert(header::LINK, value);
    }
    if let Some(ref vars) = vars {
        headers.insert(
            CANONICAL_PAGE_ID,
            HeaderValue::from(vars.canonical_page_id.0),
        );
    }

    Ok(response)
}

fn render_html(page: &PageRecord, vars: Option<&QueryVars>) -> String {
    let mut meta = String::new();
    if let Some(vars) = vars {
        for (name, value) in vars.pairs() {
            meta.push_str(&format!(
                "<meta name=\"query-var:{}\" content=\"{}\">\n",
                escape_html(&name),
                escape_html(&value)
            ));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <link rel=\"canonical\" href=\"{href}\">\n{meta}</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(&page.title),
        href = escape_html(&canonical_href(&page.slug)),
        meta = meta,
        body = page.body,
    )
}

/// `/` + the slug with each segment percent-encoded.
fn canonical_href(slug: &str) -> String {
    let segments: Vec<String> = slug
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect();
    format!("/{}", segments.join("/"))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
