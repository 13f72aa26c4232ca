use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{dispatch, handlers};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Site pages: alias resolution in front of the renderer
    let site = Router::new()
        .fallback(handlers::serve_page)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            dispatch::expose_query_vars,
        ))
        .with_state(Arc::clone(&state));

    let mut router = Router::new()
        // Pages
        .route("/pages", get(handlers::list_pages))
        .route("/pages", post(handlers::create_page))
        .route("/pages/:id", delete(handlers::delete_page))
        .route("/pages/:id", get(handlers::get_page))
        .route("/pages/:id", put(handlers::update_page))
        .route("/pages/:id/canonical", get(handlers::get_canonical))
        .route("/pages/:id/canonical", put(handlers::put_canonical))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .route("/_internal/routes", get(handlers::route_table))
        .route("/_internal/routes/rebuild", post(handlers::rebuild_routes));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router
        .fallback_service(site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderMap, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::testutil::test_state;

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>, HeaderMap) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec(), headers)
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn create(router: &Router, title: &str, slug: &str, canonical: Option<&str>) -> u64 {
        let (status, body, _) = send(
            router,
            Method::POST,
            "/pages",
            Some(json!({ "title": title, "slug": slug, "body": "<p>hi</p>", "canonical": canonical })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
        json_body(&body)["data"]["id"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn test_alias_serves_page_with_query_vars() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let id = create(&router, "Magazine", "magazine", Some("news/(.*)")).await;

        let (status, body, headers) = send(&router, Method::GET, "/news/2024", None).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("<link rel=\"canonical\" href=\"/magazine\">"));
        assert!(html.contains(&format!("name=\"query-var:canonical_page_id\" content=\"{id}\"")));
        assert!(html.contains("name=\"query-var:matches[1]\" content=\"2024\""));
        assert_eq!(
            headers.get("x-canonical-page-id").unwrap().to_str().unwrap(),
            id.to_string()
        );
        assert_eq!(
            headers.get("link").unwrap().to_str().unwrap(),
            "</magazine>; rel=\"canonical\""
        );
    }

    #[tokio::test]
    async fn test_unmatched_path_falls_through_to_slug() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        create(&router, "About", "about", Some("company")).await;

        let (status, body, headers) = send(&router, Method::GET, "/about", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get("x-canonical-page-id").is_none());
        assert!(!String::from_utf8(body).unwrap().contains("query-var:"));

        let (status, _, _) = send(&router, Method::GET, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_canonical_moves_alias() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let id = create(&router, "Promo", "promo", Some("a")).await;
        let uri = format!("/pages/{id}/canonical");

        let (status, body, _) = send(&router, Method::PUT, &uri, Some(json!({ "canonical": " /b/ " }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["data"]["canonical"], "b");

        let (status, _, _) = send(&router, Method::GET, "/a", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&router, Method::GET, "/b", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(&router, Method::PUT, &uri, Some(json!({ "canonical": null }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json_body(&body)["data"]["canonical"].is_null());
        let (status, _, _) = send(&router, Method::GET, "/b", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_canonical_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let first = create(&router, "First", "first", Some("shared")).await;
        let second = create(&router, "Second", "second", None).await;

        let (status, body, _) = send(
            &router,
            Method::PUT,
            &format!("/pages/{second}/canonical"),
            Some(json!({ "canonical": "shared" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_body(&body)["status"], "fail");

        let (status, _, _) = send(
            &router,
            Method::PUT,
            &format!("/pages/{first}/canonical"),
            Some(json!({ "canonical": "news/(unclosed" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &router,
            Method::PUT,
            "/pages/999/canonical",
            Some(json!({ "canonical": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_with_invalid_alias_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let (status, _, _) = send(
            &router,
            Method::POST,
            "/pages",
            Some(json!({ "title": "Root", "slug": "root", "canonical": ".*" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.db.list_pages().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_page_prunes_alias() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let id = create(&router, "Old", "old", Some("legacy")).await;
        let (status, _, _) = send(&router, Method::DELETE, &format!("/pages/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        assert!(state.router.snapshot().is_empty());
        let (status, _, _) = send(&router, Method::GET, "/legacy", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_table_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let (_, body, _) = send(&router, Method::GET, "/_internal/health", None).await;
        assert_eq!(json_body(&body)["data"]["router"], "stale");

        create(&router, "One", "one", Some("first")).await;
        create(&router, "Two", "two", Some("second/(.*)")).await;

        let (status, body, _) = send(&router, Method::GET, "/_internal/routes", None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &json_body(&body)["data"];
        assert_eq!(data["state"], "active");
        assert_eq!(data["routes"][0]["alias_path"], "first");
        assert_eq!(data["routes"][0]["literal"], true);
        assert_eq!(data["routes"][1]["alias_path"], "second/(.*)");
        assert_eq!(data["routes"][1]["literal"], false);
    }

    #[tokio::test]
    async fn test_page_crud_and_slug_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let id = create(&router, "Home", "home", None).await;
        let (status, _, _) = send(
            &router,
            Method::POST,
            "/pages",
            Some(json!({ "title": "Dup", "slug": "/home/" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body, _) = send(
            &router,
            Method::PUT,
            &format!("/pages/{id}"),
            Some(json!({ "title": "Welcome", "slug": "welcome", "canonical": "start" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &json_body(&body)["data"];
        assert_eq!(data["title"], "Welcome");
        assert_eq!(data["slug"], "welcome");
        assert_eq!(data["canonical"], "start");

        let (status, _, _) = send(&router, Method::GET, "/home", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&router, Method::GET, "/start", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(&router, Method::GET, "/pages?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["data"]["pagination"]["total"], 1);

        let (status, _, _) = send(&router, Method::PUT, &format!("/pages/{id}"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(&router, Method::POST, "/start", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_percent_encoded_paths_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        let id = create(&router, "Café", "café", Some("über")).await;
        create(&router, "Menu", "menu", Some("karte/(.*)")).await;

        let (status, _, headers) = send(&router, Method::GET, "/%C3%BCber", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get("x-canonical-page-id").unwrap().to_str().unwrap(),
            id.to_string()
        );
        assert_eq!(
            headers.get("link").unwrap().to_str().unwrap(),
            "</caf%C3%A9>; rel=\"canonical\""
        );

        let (status, body, _) = send(&router, Method::GET, "/caf%C3%A9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body)
            .unwrap()
            .contains("<link rel=\"canonical\" href=\"/caf%C3%A9\">"));

        // Captures carry the decoded text
        let (status, body, _) = send(&router, Method::GET, "/karte/cr%C3%AApes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body)
            .unwrap()
            .contains("name=\"query-var:matches[1]\" content=\"crêpes\""));
    }

    #[tokio::test]
    async fn test_purge_clears_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let router = create_router(Arc::clone(&state));

        create(&router, "Gone", "gone", Some("soon")).await;
        let (status, body, _) = send(&router, Method::DELETE, "/admin/purge", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["data"]["pages_deleted"], 1);
        assert!(state.router.snapshot().is_empty());
    }
}
