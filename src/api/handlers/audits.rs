//! Handlers for audit history.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use crate::api::dto::audits::{AuditListResponse, HealthMetricsResponse};
use crate::api::dto::pagination::{LimitParams, PaginationMeta, PaginationParams};
use crate::application::services::ReportPage;
use crate::domain::entities::MaintenanceReport;
use crate::error::AppError;
use crate::state::AppState;

/// Lists past runs, newest first.
///
/// # Endpoint
///
/// `GET /api/audits?page=1&page_size=25`
pub async fn list_audits_handler(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<AuditListResponse>, AppError> {
    let (offset, limit) = params
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let (items, total_items) = state.maintenance.list_runs(offset, limit).await?;

    Ok(Json(AuditListResponse {
        pagination: PaginationMeta::new(&params, total_items),
        items,
    }))
}

/// Full JSON report of one run.
///
/// # Endpoint
///
/// `GET /api/audits/{id}`
pub async fn get_audit_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceReport>, AppError> {
    Ok(Json(state.maintenance.get_report(id).await?))
}

/// HTML report of one run.
///
/// # Endpoint
///
/// `GET /api/audits/{id}/report`
pub async fn audit_report_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ReportPage, AppError> {
    let report = state.maintenance.get_report(id).await?;
    Ok(ReportPage::from(&report))
}

/// Recent link health data points.
///
/// # Endpoint
///
/// `GET /api/metrics/health?limit=30`
pub async fn health_metrics_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<HealthMetricsResponse>, AppError> {
    let items = state
        .maintenance
        .recent_health(params.clamped(30, 365))
        .await?;

    Ok(Json(HealthMetricsResponse {
        total: items.len(),
        items,
    }))
}
