//! Shared helpers for the API integration tests

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use catalog_server::{
    api,
    config::{AppConfig, IntegrityConfig, StoreBackend},
    repository::{memory::MemoryStore, Repository},
    services::Services,
    AppState,
};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Router over a fresh in-memory store
pub fn app_with(integrity: IntegrityConfig) -> Router {
    let mut config = AppConfig::default();
    config.store.backend = StoreBackend::Memory;
    config.integrity = integrity;

    let repository = Repository::new(Arc::new(MemoryStore::new()));
    let services = Services::new(repository, &config.integrity);
    api::create_router(AppState::new(config, services))
}

pub fn app() -> Router {
    app_with(IntegrityConfig::default())
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };

    TestResponse { status, headers, body }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::DELETE, uri, None).await
}

/// Create a record and return its id
pub async fn create(app: &Router, collection: &str, body: Value) -> String {
    let response = post(app, &format!("/api/v1/catalog/{}", collection), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"]
        .as_str()
        .expect("id in created record")
        .to_string()
}
