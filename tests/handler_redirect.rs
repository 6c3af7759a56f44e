mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use std::sync::Arc;
use tny_shortener::api::handlers::redirect_handler;
use tny_shortener::domain::repositories::CodeStore;
use tny_shortener::infrastructure::persistence::InMemoryCodeStore;
use tny_shortener::routes::build_router;
use tny_shortener::utils::code_generator::RESERVED_CODES;

fn redirect_app(state: tny_shortener::AppState) -> Router {
    Router::new()
        .route("/{code}", get(redirect_handler))
        .layer(common::MockConnectInfoLayer)
        .with_state(state)
}

#[tokio::test]
async fn test_redirect_success() {
    let (state, store, _rx) = common::create_test_state();
    store.insert("aB3", "https://example.com/target").await.unwrap();
    let server = TestServer::new(redirect_app(state)).unwrap();

    let response = server.get("/aB3").await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_counts_access() {
    let (state, store, _rx) = common::create_test_state();
    store.insert("aB3", "https://example.com").await.unwrap();
    let server = TestServer::new(redirect_app(state)).unwrap();

    server.get("/aB3").await;
    server.get("/aB3").await;

    assert_eq!(store.get("aB3").await.unwrap().access_count, 2);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (state, _store, _rx) = common::create_test_state();
    let server = TestServer::new(redirect_app(state)).unwrap();

    let response = server.get("/nope").await;

    response.assert_status_not_found();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["details"]["code"], "nope");
}

#[tokio::test]
async fn test_redirect_malformed_code() {
    let (state, store, _rx) = common::create_test_state();
    // Stored directly, bypassing the generator's alphabet and length.
    store.insert("a-b", "https://example.com").await.unwrap();
    store.insert("abcdefgh", "https://example.com").await.unwrap();
    let server = TestServer::new(redirect_app(state)).unwrap();

    server.get("/a-b").await.assert_status_not_found();
    server.get("/abcdefgh").await.assert_status_not_found();

    assert_eq!(store.get("a-b").await.unwrap().access_count, 0);
    assert_eq!(store.get("abcdefgh").await.unwrap().access_count, 0);
}

#[tokio::test]
async fn test_redirect_sends_page_view() {
    let (state, store, mut rx) = common::create_test_state();
    store.insert("aB3", "https://example.com/target").await.unwrap();
    let server = TestServer::new(redirect_app(state)).unwrap();

    server
        .get("/aB3")
        .add_header("User-Agent", "TestAgent/1.0")
        .await;

    let event = rx.try_recv().unwrap();
    assert_eq!(event.long_url, "https://example.com/target");
    assert_eq!(event.ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(event.user_agent.as_deref(), Some("TestAgent/1.0"));
}

#[tokio::test]
async fn test_redirect_miss_sends_no_page_view() {
    let (state, _store, mut rx) = common::create_test_state();
    let server = TestServer::new(redirect_app(state)).unwrap();

    server.get("/nope").await.assert_status_not_found();

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_survives_full_page_view_queue() {
    let store = Arc::new(InMemoryCodeStore::new());
    store.insert("aB3", "https://example.com").await.unwrap();
    let (state, _rx) = common::create_state_with_store(store, 1);
    let server = TestServer::new(redirect_app(state)).unwrap();

    // The first event fills the queue; the rest are dropped.
    for _ in 0..3 {
        assert_eq!(server.get("/aB3").await.status_code(), 307);
    }
}

#[tokio::test]
async fn test_redirect_storage_unavailable() {
    let (state, _rx) = common::create_state_with_store(Arc::new(common::UnavailableStore), 10);
    let server = TestServer::new(redirect_app(state)).unwrap();

    let response = server.get("/aB3").await;

    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn test_full_router_serves_static_and_routes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>tny</h1>").unwrap();
    std::fs::write(dir.path().join("app.css"), "body {}").unwrap();

    let (state, store, _rx) = common::create_test_state();
    store.insert("aB3", "https://example.com").await.unwrap();
    let app = build_router(state, dir.path()).layer(common::MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    let index = server.get("/").await;
    index.assert_status_ok();
    assert_eq!(index.text(), "<h1>tny</h1>");

    let css = server.get("/static/app.css").await;
    css.assert_status_ok();
    assert_eq!(css.text(), "body {}");

    server.get("/health").await.assert_status_ok();

    assert_eq!(server.get("/aB3").await.status_code(), 307);
    server.get("/zzz").await.assert_status_not_found();
}

#[tokio::test]
async fn test_reserved_codes_are_shadowed_by_fixed_routes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>tny</h1>").unwrap();

    let (state, store, _rx) = common::create_test_state();
    for code in RESERVED_CODES {
        store.insert(code, "https://hijack.example").await.unwrap();
    }
    let app = build_router(state, dir.path()).layer(common::MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    for code in RESERVED_CODES {
        let response = server.get(&format!("/{code}")).await;
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        assert_ne!(location.as_deref(), Some("https://hijack.example"), "/{code}");
        assert_eq!(store.get(code).await.unwrap().access_count, 0, "/{code}");
    }
}
