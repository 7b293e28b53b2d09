//! API integration tests
//!
//! Drive the management API through the full router and check status codes
//! and response bodies for every registry outcome.

use aliaskeep::config::Config;
use aliaskeep::models::{CreateLinkResponse, LinkStatsResponse, LinkView};
use aliaskeep::registry::{NewLink, Registry};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app() -> (Arc<Registry>, Router) {
    let config = Config::default();
    let registry = Arc::new(Registry::new(config.registry_settings()));
    let app = aliaskeep::create_router(Arc::clone(&registry), &config);
    (registry, app)
}

fn post_json(uri: &str, body: Value, owner: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(owner) = owner {
        builder = builder.header("x-owner-id", owner);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn request(method: &str, uri: &str, owner: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header("x-owner-id", owner);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_, app) = create_test_app();
    let response = app.oneshot(request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_with_requested_alias() {
    let (registry, app) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/api/links",
            json!({"url": "https://example.com", "alias": "demo", "expiry": "7days"}),
            Some("alice"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: CreateLinkResponse = body_json(response).await;
    assert_eq!(body.alias, "demo");
    assert_eq!(body.short_url, "http://localhost:5000/go/demo");
    assert!(body.qr_code_url.starts_with("https://api.qrserver.com/v1/create-qr-code/?"));
    assert!(body.qr_code_url.contains("data=http%3A%2F%2Flocalhost%3A5000%2Fgo%2Fdemo"));
    assert!(body.expires_at.is_some());

    let stored = registry.link("demo").unwrap();
    assert_eq!(stored.owner_id.as_deref(), Some("alice"));
    assert_eq!(stored.click_count, 0);
}

#[tokio::test]
async fn test_create_generates_alias_when_blank() {
    let (registry, app) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/shorten",
            json!({"url": "https://example.com/page", "alias": ""}),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: CreateLinkResponse = body_json(response).await;
    assert_eq!(body.alias.len(), 6);
    assert!(body.expires_at.is_none());
    assert_eq!(
        registry.link(&body.alias).unwrap().target_url,
        "https://example.com/page"
    );
}

#[tokio::test]
async fn test_create_error_statuses() {
    let (registry, app) = create_test_app();
    registry
        .create_link(NewLink::new("https://example.com").with_alias("taken"))
        .unwrap();

    let cases = [
        (json!({"url": "example.com"}), StatusCode::BAD_REQUEST),
        (json!({"url": "ftp://example.com"}), StatusCode::BAD_REQUEST),
        (
            json!({"url": "https://example.com", "alias": "health"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"url": "https://example.com", "alias": "bad alias"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"url": "https://example.com", "expiry": "custom"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"url": "https://example.com", "expiry": "2000-01-01"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"url": "https://other.com", "alias": "taken"}),
            StatusCode::CONFLICT,
        ),
    ];

    for (payload, expected) in cases {
        let response = app
            .clone()
            .oneshot(post_json("/api/links", payload.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "payload: {payload}");
        let body: Value = body_json(response).await;
        assert!(body["error"].is_string(), "payload: {payload}");
    }

    assert_eq!(registry.len(), 1, "failed creations must not store anything");
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let (_, app) = create_test_app();

    for (alias, owner) in [("a1", "alice"), ("b1", "bob"), ("a2", "alice")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/links",
                json!({"url": "https://example.com", "alias": alias, "password": "pw"}),
                Some(owner),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/links", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let links: Vec<LinkView> = body_json(response).await;
    let aliases: Vec<&str> = links.iter().map(|l| l.alias.as_str()).collect();
    assert_eq!(aliases, vec!["a1", "a2"]);
    assert!(links.iter().all(|l| l.password_protected));

    let response = app
        .oneshot(request("GET", "/api/links", None))
        .await
        .unwrap();
    let links: Vec<LinkView> = body_json(response).await;
    assert_eq!(links.len(), 3);

    // Password material never leaks into the view
    let raw = serde_json::to_string(&links).unwrap();
    assert!(!raw.contains("$argon2"));
}

#[tokio::test]
async fn test_get_link_and_expiring_soon() {
    let (_, app) = create_test_app();
    app.clone()
        .oneshot(post_json(
            "/api/links",
            json!({"url": "https://example.com", "alias": "brief", "expiry": "1day"}),
            None,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/links/brief", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: LinkView = body_json(response).await;
    assert!(view.expiring_soon);
    assert!(!view.password_protected);

    let response = app
        .oneshot(request("GET", "/api/links/missing", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_respects_ownership() {
    let (registry, app) = create_test_app();
    app.clone()
        .oneshot(post_json(
            "/api/links",
            json!({"url": "https://example.com", "alias": "owned"}),
            Some("alice"),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/links/owned", Some("mallory")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("DELETE", "/delete/owned", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(registry.is_empty());

    let response = app
        .oneshot(request("DELETE", "/api/links/owned", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_after_redirects() {
    let (_, app) = create_test_app();
    app.clone()
        .oneshot(post_json(
            "/api/links",
            json!({"url": "https://example.com", "alias": "counted"}),
            None,
        ))
        .await
        .unwrap();

    for _ in 0..3 {
        let redirect = Request::builder()
            .uri("/go/counted")
            .header("referer", "https://forum.example/thread/9")
            .header("cf-ipcountry", "se")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(redirect).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    let response = app
        .oneshot(request("GET", "/api/links/counted/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats: LinkStatsResponse = body_json(response).await;
    assert_eq!(stats.click_count, 3);
    assert_eq!(stats.stats.events.len(), 3);
    assert_eq!(stats.stats.referrers["forum.example"], 3);
    assert_eq!(stats.stats.countries["SE"], 3);
}

#[tokio::test]
async fn test_anonymous_registry_without_ownership() {
    let mut config = Config::default();
    config.enforce_ownership = false;
    let registry = Arc::new(Registry::new(config.registry_settings()));
    let app = aliaskeep::create_router(Arc::clone(&registry), &config);

    app.clone()
        .oneshot(post_json(
            "/api/links",
            json!({"url": "https://example.com", "alias": "shared"}),
            Some("alice"),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request("DELETE", "/api/links/shared", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
