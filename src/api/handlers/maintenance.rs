//! Handler for on-demand maintenance runs.

use axum::{Json, extract::State};
use serde_json::json;
use validator::Validate;

use crate::api::dto::maintenance::RunRequest;
use crate::application::services::RunOptions;
use crate::domain::entities::{AuditTrigger, MaintenanceReport};
use crate::error::AppError;
use crate::state::AppState;

/// Runs the full pipeline and returns the report.
///
/// # Endpoint
///
/// `POST /api/maintenance/run`
///
/// # Request Body
///
/// ```json
/// { "trigger": "cron", "dry_run": false, "auto_correct": true }
/// ```
///
/// # Errors
///
/// - 400 for an unknown trigger
/// - 409 if a run is already in progress
pub async fn run_maintenance_handler(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<MaintenanceReport>, AppError> {
    payload.validate()?;

    let trigger = match payload.trigger.as_deref() {
        None => AuditTrigger::Manual,
        Some(raw) => AuditTrigger::parse(raw).ok_or_else(|| {
            AppError::bad_request(
                "Unknown trigger",
                json!({"trigger": raw, "allowed": ["manual", "cron", "scheduled"]}),
            )
        })?,
    };

    let report = state
        .maintenance
        .run(RunOptions {
            trigger,
            dry_run: payload.dry_run,
            auto_correct: payload.auto_correct,
        })
        .await?;

    Ok(Json(report))
}
