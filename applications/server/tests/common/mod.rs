//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use http_body_util::BodyExt;
use iseng_core::testing::{InMemoryStore, InMemoryWriter, SequenceIdGenerator};
use iseng_core::UserService;
use iseng_server::{create_router, routes::App, AppState};
use serde_json::Value;
use std::sync::Arc;

/// Router over the in-memory fakes, plus handles to inspect them
pub struct TestApp {
    pub router: App,
    pub store: InMemoryStore,
    pub writer: Arc<InMemoryWriter>,
}

pub fn create_test_app() -> TestApp {
    let store = InMemoryStore::new();
    let writer = Arc::new(InMemoryWriter::new(store.clone()));
    let service = UserService::new(
        Arc::new(store.clone()),
        Arc::clone(&writer),
        Arc::new(SequenceIdGenerator::new()),
    );

    TestApp {
        router: create_router(AppState::new(Arc::new(service))),
        store,
        writer,
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
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

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
