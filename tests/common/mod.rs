#![allow(dead_code)]

use axum::{Router, middleware};
use link_audit::api::middleware::auth;
use link_audit::api::routes::{heavy_routes, protected_routes};
use link_audit::config::Config;
use link_audit::state::AppState;
use std::path::Path;
use tempfile::TempDir;

pub const TEST_TOKEN: &str = "test-token";

/// A small Next.js-style tree: `/services` exists, `/Services` does not.
pub fn create_test_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("app/services")).unwrap();
    std::fs::write(
        root.join("app/services/page.tsx"),
        "export default function Services() {}\n",
    )
    .unwrap();
    std::fs::write(
        root.join("app/page.tsx"),
        "<Link href=\"/services\">Services</Link>\n<a href=\"/Services\">More</a>\n",
    )
    .unwrap();
    dir
}

pub fn test_config(root: &Path) -> Config {
    let mut config = Config::defaults(root);
    config.api_tokens = vec![TEST_TOKEN.to_string()];
    config.token_signing_secret = "test-signing-secret".to_string();
    config.validator_batch_delay_ms = 0;
    config.validator_retry_delay_ms = 0;
    config.validator_max_retries = 0;
    config.correction_min_budget_secs = 0;
    config
}

pub fn create_test_state(root: &Path) -> AppState {
    AppState::in_memory(test_config(root)).unwrap()
}

/// API routes behind the auth middleware, without rate limiting.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(heavy_routes())
        .merge(protected_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new().nest("/api", api).with_state(state)
}

pub fn bearer() -> String {
    format!("Bearer {TEST_TOKEN}")
}
