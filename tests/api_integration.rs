//! API integration tests for obsvc
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use obsvc::api::{self, CollectorHandler, CollectorRoutes, Envelope, ResponseFormat};
use obsvc::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

// =============================================================================
// Test Helpers
// =============================================================================

fn ok_collector(name: &str, kind: &str) -> Arc<dyn Collector> {
    Arc::new(FnCollector::new(name, kind, || async { Ok(()) }))
}

async fn send(app: &Router, uri: &str, accept: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(accept) = accept {
        request = request.header(header::ACCEPT, accept);
    }

    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, uri, None).await;
    (status, serde_json::from_str(&body).unwrap())
}

/// Exposes how many times its collector ran
struct CountingHandler {
    id: String,
    calls: Arc<AtomicUsize>,
}

impl CollectorHandler for CountingHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn register_endpoints(&self, _store: &CollectorStore, routes: &mut CollectorRoutes) {
        let calls = Arc::clone(&self.calls);
        routes
            .scoped_route(
                "count",
                get(move |format: ResponseFormat| {
                    let calls = Arc::clone(&calls);
                    async move { format.render(Envelope::response(calls.load(Ordering::SeqCst))) }
                }),
            )
            .shared_route(
                "counting/ids",
                get(|State(store): State<CollectorStore>, format: ResponseFormat| async move {
                    let envelope = match store.get_collectors_of_type("counting") {
                        Ok(found) => {
                            let mut ids: Vec<_> = found.into_keys().collect();
                            ids.sort();
                            Envelope::response(ids)
                        }
                        Err(e) => e.into(),
                    };
                    format.render(envelope)
                }),
            );
    }
}

/// Registers a per-type summary path shared by every disk collector
struct DiskHandler {
    id: String,
}

impl CollectorHandler for DiskHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn register_endpoints(&self, _store: &CollectorStore, routes: &mut CollectorRoutes) {
        let owner = self.id.clone();
        let own = self.id.clone();
        routes
            .shared_route(
                "disk/summary",
                get(move |format: ResponseFormat| {
                    let owner = owner.clone();
                    async move { format.render(Envelope::response(owner)) }
                }),
            )
            .scoped_route(
                "whoami",
                get(move |format: ResponseFormat| {
                    let own = own.clone();
                    async move { format.render(Envelope::response(own)) }
                }),
            );
    }
}

// =============================================================================
// Endpoints
// =============================================================================

#[tokio::test]
async fn test_ping() {
    let app = api::router(CollectorStore::new(), &[]);
    let (status, body) = send(&app, "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn test_list_groups_by_type() {
    let store = CollectorStore::new();
    for (id, kind) in [("disk-1", "disk"), ("net-1", "net"), ("disk-0", "disk")] {
        store
            .add_collector_with_id(id, Duration::from_secs(60), Duration::ZERO, ok_collector(id, kind))
            .unwrap();
    }
    let app = api::router(store.clone(), &[]);

    let (status, body) = get_json(&app, "/api/collectors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "error": false,
            "result": { "disk": ["disk-0", "disk-1"], "net": ["net-1"] }
        })
    );

    store.shutdown().await;
}

#[tokio::test]
async fn test_empty_list() {
    let app = api::router(CollectorStore::new(), &[]);
    let (status, body) = get_json(&app, "/api/collectors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "result": {} }));
}

#[tokio::test]
async fn test_unknown_collector_is_not_found() {
    let app = api::router(CollectorStore::new(), &[]);
    let (status, body) = get_json(&app, "/api/collector/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": true, "error_code": "unknown_collector" }));
}

#[tokio::test]
async fn test_collector_that_never_ran() {
    let store = CollectorStore::new();
    store
        .add_collector_with_id("cpu", Duration::from_secs(60), Duration::ZERO, ok_collector("CPU", "system"))
        .unwrap();
    let app = api::router(store.clone(), &[]);

    let (status, body) = get_json(&app, "/api/collector/cpu").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "error": false,
            "result": {
                "name": "CPU",
                "type": "system",
                "last_collection_ms": null,
                "last_collection_error": null,
                "last_collection_duration_ms": null,
                "active": true
            }
        })
    );

    store.shutdown().await;
}

#[tokio::test]
async fn test_failed_collection_is_reported() {
    let store = CollectorStore::new();
    let failing = Arc::new(FnCollector::new("B", "failing", || async {
        Err(anyhow::anyhow!("boom"))
    }));
    store
        .add_collector_with_id("b", Duration::from_millis(5), Duration::ZERO, failing)
        .unwrap();
    let app = api::router(store.clone(), &[]);

    let mut result = Value::Null;
    for _ in 0..500 {
        let (status, body) = get_json(&app, "/api/collector/b").await;
        assert_eq!(status, StatusCode::OK);
        result = body["result"].clone();
        if !result["last_collection_ms"].is_null() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(result["last_collection_ms"].as_i64().unwrap() > 0);
    assert_eq!(result["last_collection_error"], "boom");

    store.shutdown().await;
}

#[tokio::test]
async fn test_yaml_when_requested() {
    let app = api::router(CollectorStore::new(), &[]);
    let (status, body) = send(&app, "/api/collector/nope", Some("application/yaml")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("error: true"));
    assert!(body.contains("error_code: unknown_collector"));
}

#[tokio::test]
async fn test_handler_endpoints() {
    let store = CollectorStore::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let collector = Arc::new(FnCollector::new("counter", "counting", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    }));
    let (id, _handle) = store
        .add_collector(Duration::from_secs(60), Duration::ZERO, collector)
        .unwrap();

    let handlers: Vec<Arc<dyn CollectorHandler>> = vec![Arc::new(CountingHandler {
        id: id.clone(),
        calls: Arc::clone(&calls),
    })];
    let app = api::router(store.clone(), &handlers);

    let (status, body) = get_json(&app, &format!("/api/collector/{}/count", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "result": 0 }));

    let (status, body) = get_json(&app, "/api/collector/counting/ids").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "result": [id.clone()] }));

    // the built-in description still resolves alongside the scoped routes
    let (status, body) = get_json(&app, &format!("/api/collector/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["name"], "counter");

    store.shutdown().await;
}

#[tokio::test]
async fn test_shared_path_first_registration_wins() {
    let handlers: Vec<Arc<dyn CollectorHandler>> = vec![
        Arc::new(DiskHandler { id: "disk-0".to_string() }),
        Arc::new(DiskHandler { id: "disk-1".to_string() }),
    ];
    let app = api::router(CollectorStore::new(), &handlers);

    let (status, body) = get_json(&app, "/api/collector/disk/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "result": "disk-0" }));

    // the second handler's own routes are still registered
    let (status, body) = get_json(&app, "/api/collector/disk-1/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": false, "result": "disk-1" }));
}
