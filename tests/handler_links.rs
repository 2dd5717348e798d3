mod common;

use axum_test::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_validate_batch_and_history() {
    let dir = common::create_test_project();
    let server =
        TestServer::new(common::api_router(common::create_test_state(dir.path()))).unwrap();

    let response = server
        .post("/api/links/validate")
        .add_header("Authorization", common::bearer())
        .json(&json!({"urls": ["/services", "/nope", "/", "/services"]}))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["summary"]["unique_urls"], 3);
    assert_eq!(json["summary"]["valid"], 2);
    assert_eq!(json["summary"]["broken"], 1);
    assert_eq!(json["results"][1]["url"], "/nope");
    assert_eq!(json["results"][1]["status"], "broken");

    let history = server
        .get("/api/links/history")
        .add_query_param("url", "/nope")
        .add_header("Authorization", common::bearer())
        .await;
    history.assert_status_ok();
    let history = history.json::<serde_json::Value>();
    assert_eq!(history["url"], "/nope");
    assert_eq!(history["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validate_rejects_empty_batch() {
    let dir = common::create_test_project();
    let server =
        TestServer::new(common::api_router(common::create_test_state(dir.path()))).unwrap();

    let response = server
        .post("/api/links/validate")
        .add_header("Authorization", common::bearer())
        .json(&json!({"urls": []}))
        .await;

    response.assert_status_bad_request();
}
