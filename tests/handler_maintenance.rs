mod common;

use axum_test::TestServer;
use serde_json::json;

fn server(root: &std::path::Path) -> TestServer {
    TestServer::new(common::api_router(common::create_test_state(root))).unwrap()
}

#[tokio::test]
async fn test_dry_run_reports_broken_link() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .post("/api/maintenance/run")
        .add_header("Authorization", common::bearer())
        .json(&json!({"dry_run": true, "auto_correct": true}))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["trigger"], "manual");
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["summary"]["links_found"], 2);
    assert_eq!(json["summary"]["broken"], 1);
    assert_eq!(json["broken"][0]["result"]["url"], "/Services");
    assert_eq!(json["suggestions"][0]["suggested_url"], "/services");
    assert_eq!(json["corrections"].as_array().unwrap().len(), 0);
    assert_eq!(json["health_score"], 50.0);

    let content = std::fs::read_to_string(dir.path().join("app/page.tsx")).unwrap();
    assert!(content.contains("/Services"));
}

#[tokio::test]
async fn test_unknown_trigger_is_rejected() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .post("/api/maintenance/run")
        .add_header("Authorization", common::bearer())
        .json(&json!({"trigger": "hourly"}))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_run_is_listed_and_rendered() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let run = server
        .post("/api/maintenance/run")
        .add_header("Authorization", common::bearer())
        .json(&json!({"trigger": "cron", "dry_run": true}))
        .await
        .json::<serde_json::Value>();
    let id = run["id"].as_i64().unwrap();

    let list = server
        .get("/api/audits")
        .add_header("Authorization", common::bearer())
        .await;
    list.assert_status_ok();
    let list = list.json::<serde_json::Value>();
    assert_eq!(list["pagination"]["total_items"], 1);
    assert_eq!(list["items"][0]["id"], id);
    assert_eq!(list["items"][0]["trigger"], "cron");
    assert_eq!(list["items"][0]["broken"], 1);

    let report = server
        .get(&format!("/api/audits/{id}"))
        .add_header("Authorization", common::bearer())
        .await;
    report.assert_status_ok();
    assert_eq!(report.json::<serde_json::Value>()["id"], id);

    let html = server
        .get(&format!("/api/audits/{id}/report"))
        .add_header("Authorization", common::bearer())
        .await;
    html.assert_status_ok();
    let body = html.text();
    assert!(body.contains("/Services"));
    assert!(body.contains("app/page.tsx:2"));

    let broken = server
        .get("/api/links/broken")
        .add_header("Authorization", common::bearer())
        .await
        .json::<serde_json::Value>();
    assert_eq!(broken["audit_id"], id);
    assert_eq!(broken["total"], 1);

    let metrics = server
        .get("/api/metrics/health")
        .add_header("Authorization", common::bearer())
        .await
        .json::<serde_json::Value>();
    assert_eq!(metrics["total"], 1);
    assert_eq!(metrics["items"][0]["broken_links"], 1);
}

#[tokio::test]
async fn test_missing_audit_returns_404() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .get("/api/audits/999")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_invalid_page_size_is_rejected() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .get("/api/audits?page_size=500")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_broken_links_empty_before_first_run() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let json = server
        .get("/api/links/broken")
        .add_header("Authorization", common::bearer())
        .await
        .json::<serde_json::Value>();

    assert!(json["audit_id"].is_null());
    assert_eq!(json["total"], 0);
}
