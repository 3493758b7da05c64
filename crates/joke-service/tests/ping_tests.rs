//! Integration tests for the public endpoints: ping and metrics.
//!
//! These drive the router directly with `tower::ServiceExt::oneshot`; no
//! identity provider is contacted.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use joke_service::config::Config;
use joke_service::routes::{build_routes, AppState};
use joke_test_utils::{test_metrics_handle, TEST_AUDIENCE};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let vars = HashMap::from([
        ("AUTH0_API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        (
            "AUTH0_DOMAIN".to_string(),
            "http://127.0.0.1:9/".to_string(),
        ),
    ]);
    let config = Config::from_vars(&vars).expect("test config should load");
    build_routes(Arc::new(AppState::new(config)), test_metrics_handle())
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_ping_with_trailing_slash() {
    let (status, body) = get("/api/").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"message": "pong"}));
}

#[tokio::test]
async fn test_ping_without_trailing_slash() {
    let (status, body) = get("/api").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"message":"pong"}"#);
}

#[tokio::test]
async fn test_ping_ignores_bad_credentials() {
    let response = app()
        .oneshot(
            Request::get("/api/")
                .header("Authorization", "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    // Generate at least one recorded request first
    let _ = get("/api/").await;

    let (status, body) = get("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("jokes_http_requests_total"));
}
