//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Storage**: Round trip to the audit store
/// 2. **Cache**: Redis PING (reported as ok when caching is disabled)
/// 3. **Monitor**: Background worker is alive
/// 4. **Backups**: Backup directory is writable
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "storage": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Redis connected" },
///     "monitor": { "status": "ok", "message": "Worker running, schedule disabled" },
///     "backups": { "status": "ok", "message": "Writable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (storage, cache, backups) = tokio::join!(
        check_storage(&state),
        check_cache(&state),
        check_backups(&state)
    );
    let monitor = check_monitor(&state).await;

    let all_healthy = storage.is_ok() && cache.is_ok() && monitor.is_ok() && backups.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage,
            cache,
            monitor,
            backups,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_storage(state: &AppState) -> CheckStatus {
    match state.audits.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Storage error: {}", e)),
    }
}

/// Checks cache connectivity via PING command.
async fn check_cache(state: &AppState) -> CheckStatus {
    if !state.config.is_cache_enabled() {
        return CheckStatus::ok("Disabled");
    }
    if state.cache.health_check().await {
        CheckStatus::ok("Redis connected")
    } else {
        CheckStatus::error("Redis connection failed")
    }
}

async fn check_monitor(state: &AppState) -> CheckStatus {
    let status = state.monitor.status().await;
    let schedule = if status.enabled { "enabled" } else { "disabled" };
    if status.worker_alive {
        CheckStatus::ok(format!("Worker running, schedule {schedule}"))
    } else {
        CheckStatus::error(format!("Worker not running, schedule {schedule}"))
    }
}

async fn check_backups(state: &AppState) -> CheckStatus {
    if state.backups.is_writable().await {
        CheckStatus::ok("Writable")
    } else {
        CheckStatus::error("Backup directory is not writable")
    }
}
