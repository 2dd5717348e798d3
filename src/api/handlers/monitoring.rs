//! Handlers for scheduled monitoring control.

use axum::{Json, extract::State};
use std::time::Duration;
use validator::Validate;

use crate::api::dto::monitoring::StartMonitoringRequest;
use crate::application::services::MonitorStatus;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/monitoring`
pub async fn monitoring_status_handler(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.monitor.status().await)
}

/// `POST /api/monitoring/start`
pub async fn start_monitoring_handler(
    State(state): State<AppState>,
    Json(payload): Json<StartMonitoringRequest>,
) -> Result<Json<MonitorStatus>, AppError> {
    payload.validate()?;
    let interval = payload.interval_secs.map(Duration::from_secs);
    Ok(Json(state.monitor.start(interval).await))
}

/// `POST /api/monitoring/stop`
pub async fn stop_monitoring_handler(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.monitor.stop().await)
}
