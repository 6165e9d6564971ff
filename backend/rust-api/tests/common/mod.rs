#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use quiz_api::{
    config::Config,
    create_router,
    services::{id_generator::SequentialIds, quiz_store::MemoryQuizStore, AppState},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const METRICS_CREDENTIALS: &str = "prom:scrape";

pub fn test_config() -> Config {
    Config {
        metrics_auth: Some(METRICS_CREDENTIALS.to_string()),
        ..Config::in_memory()
    }
}

/// Router over a fresh in-memory store with deterministic question ids.
pub fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::with_id_generator(
        test_config(),
        Arc::new(MemoryQuizStore::new()),
        Arc::new(SequentialIds::new("q")),
    ));

    create_router(app_state)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
