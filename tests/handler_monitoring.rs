mod common;

use axum_test::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_start_and_stop_monitoring() {
    let dir = common::create_test_project();
    let server =
        TestServer::new(common::api_router(common::create_test_state(dir.path()))).unwrap();

    let started = server
        .post("/api/monitoring/start")
        .add_header("Authorization", common::bearer())
        .json(&json!({"interval_secs": 3600}))
        .await;
    started.assert_status_ok();
    let json = started.json::<serde_json::Value>();
    assert_eq!(json["enabled"], true);
    assert_eq!(json["interval_secs"], 3600);

    let stopped = server
        .post("/api/monitoring/stop")
        .add_header("Authorization", common::bearer())
        .await;
    stopped.assert_status_ok();
    let json = stopped.json::<serde_json::Value>();
    assert_eq!(json["enabled"], false);
    assert!(json["next_run_at"].is_null());
}

#[tokio::test]
async fn test_start_rejects_short_interval() {
    let dir = common::create_test_project();
    let server =
        TestServer::new(common::api_router(common::create_test_state(dir.path()))).unwrap();

    let response = server
        .post("/api/monitoring/start")
        .add_header("Authorization", common::bearer())
        .json(&json!({"interval_secs": 5}))
        .await;

    response.assert_status_bad_request();
}
