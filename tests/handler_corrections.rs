mod common;

use axum_test::TestServer;
use serde_json::json;

fn server(root: &std::path::Path) -> TestServer {
    TestServer::new(common::api_router(common::create_test_state(root))).unwrap()
}

#[tokio::test]
async fn test_suggest_proposes_known_url() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .post("/api/corrections/suggest")
        .add_header("Authorization", common::bearer())
        .json(&json!({"urls": ["/services", "/Services"]}))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["status"], "valid");
    assert!(items[0]["suggestions"].as_array().unwrap().is_empty());
    assert_eq!(items[1]["status"], "broken");
    assert_eq!(items[1]["suggestions"][0]["suggested_url"], "/services");
}

#[tokio::test]
async fn test_apply_then_rollback_restores_file() {
    let dir = common::create_test_project();
    let original = std::fs::read(dir.path().join("app/page.tsx")).unwrap();
    let server = server(dir.path());

    let response = server
        .post("/api/corrections/apply")
        .add_header("Authorization", common::bearer())
        .json(&json!({
            "corrections": [
                {
                    "original_url": "/Services",
                    "suggested_url": "/services",
                    "file_path": "app/page.tsx",
                    "correction_type": "typo"
                },
                {
                    "original_url": "/Services",
                    "suggested_url": "/services",
                    "file_path": "app/missing.tsx",
                    "correction_type": "typo"
                }
            ]
        }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["applied"], 1);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["items"][1]["error"]["code"], "not_found");

    let rollback_id = json["items"][0]["rollback_id"].as_str().unwrap().to_string();
    let rewritten = std::fs::read_to_string(dir.path().join("app/page.tsx")).unwrap();
    assert!(!rewritten.contains("/Services"));

    let backups = server
        .get("/api/corrections/backups")
        .add_header("Authorization", common::bearer())
        .await
        .json::<serde_json::Value>();
    assert_eq!(backups["total"], 1);
    assert_eq!(backups["items"][0]["rollback_id"], rollback_id.as_str());

    let history = server
        .get("/api/corrections")
        .add_header("Authorization", common::bearer())
        .await
        .json::<serde_json::Value>();
    assert_eq!(history["items"][0]["rollback_id"], rollback_id.as_str());

    let rollback = server
        .post(&format!("/api/corrections/{rollback_id}/rollback"))
        .add_header("Authorization", common::bearer())
        .await;
    rollback.assert_status_ok();
    assert_eq!(rollback.json::<serde_json::Value>()["ledger_updated"], true);
    assert_eq!(std::fs::read(dir.path().join("app/page.tsx")).unwrap(), original);

    let again = server
        .post(&format!("/api/corrections/{rollback_id}/rollback"))
        .add_header("Authorization", common::bearer())
        .await;
    again.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_apply_outside_root_fails_per_item() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .post("/api/corrections/apply")
        .add_header("Authorization", common::bearer())
        .json(&json!({
            "corrections": [{
                "original_url": "/a",
                "suggested_url": "/b",
                "file_path": "../outside.tsx",
                "correction_type": "similar"
            }]
        }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["items"][0]["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_empty_apply_is_rejected() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let response = server
        .post("/api/corrections/apply")
        .add_header("Authorization", common::bearer())
        .json(&json!({"corrections": []}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_rollback_unknown_and_malformed_ids() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    let unknown = server
        .post("/api/corrections/20250101T000000Z-AAAAAAAA/rollback")
        .add_header("Authorization", common::bearer())
        .await;
    unknown.assert_status_not_found();

    let malformed = server
        .post("/api/corrections/bad.id/rollback")
        .add_header("Authorization", common::bearer())
        .await;
    malformed.assert_status_bad_request();
}

#[tokio::test]
async fn test_prune_keeps_newest_backups() {
    let dir = common::create_test_project();
    let server = server(dir.path());

    for (from, to) in [("/Services", "/services"), ("/services", "/Services")] {
        server
            .post("/api/corrections/apply")
            .add_header("Authorization", common::bearer())
            .json(&json!({
                "corrections": [{
                    "original_url": from,
                    "suggested_url": to,
                    "file_path": "app/page.tsx",
                    "correction_type": "typo"
                }]
            }))
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/api/corrections/backups/prune")
        .add_header("Authorization", common::bearer())
        .json(&json!({"retention": 1}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["removed"], 1);
}
