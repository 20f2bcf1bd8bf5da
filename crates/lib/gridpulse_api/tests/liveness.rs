//! Integration tests: the liveness endpoint over fake dependency pingers.

mod common;

use axum::http::StatusCode;
use common::{FakePinger, app_with, get, send};
use gridpulse_core::auth::policy::AccountPolicy;
use serde_json::json;

#[tokio::test]
async fn healthy_dependencies_report_ok() {
    let app = app_with(AccountPolicy::Ignore, FakePinger::Healthy, FakePinger::Healthy);
    let (status, body) = send(&app.router, get("/livenes", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"postgres": "OK", "redis": "OK"}));
}

#[tokio::test]
async fn failing_postgres_is_a_server_error() {
    let app = app_with(
        AccountPolicy::Ignore,
        FakePinger::Failing("connection refused"),
        FakePinger::Healthy,
    );
    let (status, body) = send(&app.router, get("/livenes", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"postgres": "connection refused", "redis": "OK"}));
}

#[tokio::test]
async fn failing_redis_is_a_server_error() {
    let app = app_with(
        AccountPolicy::Ignore,
        FakePinger::Healthy,
        FakePinger::Failing("redis down"),
    );
    let (status, body) = send(&app.router, get("/liveness", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["postgres"], "OK");
    assert_eq!(body["redis"], "redis down");
}

#[tokio::test(start_paused = true)]
async fn slow_postgres_reports_deadline_exceeded() {
    let app = app_with(AccountPolicy::Ignore, FakePinger::Hanging, FakePinger::Healthy);
    let (status, body) = send(&app.router, get("/livenes", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["postgres"], "deadline exceeded after 10s");
    assert_eq!(body["redis"], "OK");
}
