// tests/api_http.rs
mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{item, temp_store, Script, ScriptedAdapter};
use resource_aggregator::ingest::config::SourcesConfig;
use resource_aggregator::ingest::fetch::FetchOptions;
use resource_aggregator::ingest::scheduler::CatalogueSource;
use resource_aggregator::{create_router, AppState, Pipeline, SourceDescriptor};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

async fn app() -> (tempfile::TempDir, Router) {
    let (dir, store) = temp_store().await;
    let adapter = ScriptedAdapter::new()
        .with(
            "Lab",
            Script::items(vec![
                item("Intro course to agents", "https://lab.test/1", "Lab"),
                item("Benchmark paper", "https://lab.test/2", "Lab"),
            ]),
        )
        .with("Down", Script::fail("502 Bad Gateway"));
    let pipeline = Pipeline::new(store, Arc::new(adapter), FetchOptions::default());
    let catalogue = SourcesConfig {
        sources: vec![
            SourceDescriptor::feed("Lab", "https://lab.test/rss"),
            SourceDescriptor::feed("Down", "https://down.test/rss"),
        ],
        manual: vec![],
    };
    let state = AppState::new(Arc::new(pipeline), CatalogueSource::Fixed(catalogue));
    (dir, create_router(state))
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_ok() {
    let (_dir, app) = app().await;
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn fetch_then_list_filter_and_stats() {
    let (_dir, app) = app().await;

    let (status, report) = call(&app, "POST", "/api/fetch").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["new_count"], 2);
    assert_eq!(report["failures"][0]["source"], "Down");

    let (_, again) = call(&app, "POST", "/api/fetch").await;
    assert_eq!(again["new_count"], 0);

    let (status, items) = call(&app, "GET", "/api/items?category=courses").await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["category"], "courses");

    let (_, stats) = call(&app, "GET", "/api/stats").await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["reading"], 1);
}

#[tokio::test]
async fn toggle_vote_and_journey() {
    let (_dir, app) = app().await;
    call(&app, "POST", "/api/fetch").await;
    let (_, items) = call(&app, "GET", "/api/items").await;
    let id = items[0]["id"].as_i64().unwrap();

    let (status, toggled) = call(&app, "POST", &format!("/api/items/{id}/toggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["checked"], true);

    let (_, unchecked) = call(&app, "GET", "/api/items?checked=false").await;
    assert_eq!(unchecked.as_array().unwrap().len(), 1);

    let (status, tally) = call(&app, "POST", &format!("/api/items/{id}/vote/up")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["upvotes"], 1);

    let (status, err) = call(&app, "POST", &format!("/api/items/{id}/vote/sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("invalid vote"));

    let (_, top) = call(&app, "GET", "/api/top-sources?limit=5").await;
    assert_eq!(top[0]["source"], "Lab");
    assert_eq!(top[0]["net_votes"], 1);

    let (_, journey) = call(&app, "GET", "/api/journey").await;
    assert_eq!(journey["total_checked"], 1);
    assert_eq!(journey["milestones"][0]["achieved"], false);
}

#[tokio::test]
async fn unknown_item_is_404() {
    let (_dir, app) = app().await;
    let (status, body) = call(&app, "POST", "/api/items/999/toggle").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("999"));

    let (status, _) = call(&app, "POST", "/api/items/999/vote/down").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
