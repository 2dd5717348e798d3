//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`]; the layers are applied in
//! [`crate::routes::app_router`].

use crate::api::handlers::{
    apply_handler, audit_report_handler, broken_links_handler, correction_history_handler,
    get_audit_handler, health_metrics_handler, link_history_handler, list_audits_handler,
    list_backups_handler, monitoring_status_handler, prune_backups_handler, rollback_handler,
    run_maintenance_handler, start_monitoring_handler, stop_monitoring_handler, suggest_handler,
    validate_links_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes that start runs or write files. Rate limited more strictly.
///
/// # Endpoints
///
/// - `POST /maintenance/run`                  - Run the full audit pipeline
/// - `POST /corrections/apply`                - Write fixes to source files
/// - `POST /corrections/{rollback_id}/rollback` - Undo a correction
pub fn heavy_routes() -> Router<AppState> {
    Router::new()
        .route("/maintenance/run", post(run_maintenance_handler))
        .route("/corrections/apply", post(apply_handler))
        .route("/corrections/{rollback_id}/rollback", post(rollback_handler))
}

/// Remaining API routes.
///
/// # Endpoints
///
/// - `GET  /audits`                           - Past runs (paginated)
/// - `GET  /audits/{id}`                      - JSON report of a run
/// - `GET  /audits/{id}/report`               - HTML report of a run
/// - `GET  /links/broken`                     - Broken links from the latest run
/// - `POST /links/validate`                   - Check an ad-hoc batch of URLs
/// - `GET  /links/history`                    - Check history of one URL
/// - `GET  /corrections`                      - Applied corrections ledger
/// - `POST /corrections/suggest`              - Propose fixes for URLs
/// - `GET  /corrections/backups`              - List backups
/// - `POST /corrections/backups/prune`        - Apply backup retention
/// - `GET  /monitoring`                       - Scheduler status
/// - `POST /monitoring/start`                 - Enable scheduled runs
/// - `POST /monitoring/stop`                  - Disable scheduled runs
/// - `GET  /metrics/health`                   - Link health time series
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/audits", get(list_audits_handler))
        .route("/audits/{id}", get(get_audit_handler))
        .route("/audits/{id}/report", get(audit_report_handler))
        .route("/links/broken", get(broken_links_handler))
        .route("/links/validate", post(validate_links_handler))
        .route("/links/history", get(link_history_handler))
        .route("/corrections", get(correction_history_handler))
        .route("/corrections/suggest", post(suggest_handler))
        .route("/corrections/backups", get(list_backups_handler))
        .route("/corrections/backups/prune", post(prune_backups_handler))
        .route("/monitoring", get(monitoring_status_handler))
        .route("/monitoring/start", post(start_monitoring_handler))
        .route("/monitoring/stop", post(stop_monitoring_handler))
        .route("/metrics/health", get(health_metrics_handler))
}
