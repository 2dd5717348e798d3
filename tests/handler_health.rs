mod common;

use axum::{Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use link_audit::api::handlers::health_handler;
use std::time::Duration;

#[tokio::test]
async fn test_health_degraded_without_monitor_worker() {
    let dir = common::create_test_project();
    let state = common::create_test_state(dir.path());
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();
    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert_eq!(json["checks"]["backups"]["status"], "ok");
    assert_eq!(json["checks"]["monitor"]["status"], "error");
}

#[tokio::test]
async fn test_health_ok_with_worker_running() {
    let dir = common::create_test_project();
    let state = common::create_test_state(dir.path());
    let handle = state.monitor.spawn();
    for _ in 0..50 {
        if state.monitor.is_worker_alive() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);
    let server = TestServer::new(app).unwrap();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
    assert_eq!(
        json["checks"]["monitor"]["message"],
        "Worker running, schedule disabled"
    );

    handle.abort();
}
