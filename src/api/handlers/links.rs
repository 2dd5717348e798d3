//! Handlers for link checks.

use axum::{
    Json,
    extract::{Query, State},
};
use std::time::Duration;
use tokio::time::Instant;
use validator::Validate;

use crate::api::dto::links::{
    BrokenLinksResponse, HistoryQuery, HistoryResponse, ValidateRequest, ValidateResponse,
};
use crate::domain::entities::AuditSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Broken links from the latest run.
///
/// # Endpoint
///
/// `GET /api/links/broken`
///
/// Returns an empty list with `audit_id: null` before the first run.
pub async fn broken_links_handler(
    State(state): State<AppState>,
) -> Result<Json<BrokenLinksResponse>, AppError> {
    let response = match state.maintenance.latest_report().await? {
        Some(report) => BrokenLinksResponse {
            audit_id: report.id,
            checked_at: report.finished_at,
            total: report.broken.len(),
            items: report.broken,
        },
        None => BrokenLinksResponse {
            audit_id: None,
            checked_at: None,
            total: 0,
            items: Vec::new(),
        },
    };

    Ok(Json(response))
}

/// Validates an ad-hoc batch of URLs.
///
/// # Endpoint
///
/// `POST /api/links/validate`
///
/// # Request Body
///
/// ```json
/// { "urls": ["https://example.com", "/services"] }
/// ```
///
/// Results are appended to the validation history without an audit id.
pub async fn validate_links_handler(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    payload.validate()?;

    let deadline = Instant::now() + Duration::from_secs(state.config.max_execution_secs);
    let batch = state
        .validator
        .validate_urls(&payload.urls, Some(deadline))
        .await;

    if let Err(e) = state.scans.append_results(None, &batch.results).await {
        tracing::warn!(error = %e, "Failed to record ad-hoc validation results");
    }

    let mut summary = AuditSummary {
        unique_urls: batch.results.len() + batch.skipped.len(),
        skipped: batch.skipped.len(),
        ..AuditSummary::default()
    };
    summary.record_results(&batch.results);

    Ok(Json(ValidateResponse {
        summary,
        results: batch.results,
        skipped: batch.skipped,
    }))
}

/// Check history of one URL, newest first.
///
/// # Endpoint
///
/// `GET /api/links/history?url=https://example.com&limit=20`
pub async fn link_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    query.validate()?;

    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let items = state.scans.url_history(&query.url, limit).await?;

    Ok(Json(HistoryResponse {
        url: query.url,
        items,
    }))
}
