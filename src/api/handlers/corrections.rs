//! Handlers for suggestions, applied corrections and rollbacks.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::time::Duration;
use tokio::time::Instant;
use validator::Validate;

use crate::api::dto::corrections::{
    ApplyRequest, ApplyResponse, ApplyResultItem, ApplySummary, BackupListResponse,
    CorrectionHistoryResponse, PruneRequest, PruneResponse, SuggestRequest, SuggestResponse,
    SuggestionItem,
};
use crate::api::dto::pagination::LimitParams;
use crate::application::services::RollbackOutcome;
use crate::domain::entities::{CorrectionSuggestion, LinkStatus};
use crate::error::AppError;
use crate::state::AppState;

/// Checks URLs and proposes ranked fixes for the broken ones.
///
/// # Endpoint
///
/// `POST /api/corrections/suggest`
///
/// Candidates are matched against URLs whose latest check was valid, plus
/// the valid URLs of this request.
pub async fn suggest_handler(
    State(state): State<AppState>,
    Json(payload): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    payload.validate()?;

    let deadline = Instant::now() + Duration::from_secs(state.config.max_execution_secs);
    let batch = state
        .validator
        .validate_urls(&payload.urls, Some(deadline))
        .await;

    let mut known = state.scans.known_good_urls().await?;
    known.extend(
        batch
            .results
            .iter()
            .filter(|r| r.status == LinkStatus::Valid)
            .map(|r| r.url.clone()),
    );

    let items = batch
        .results
        .iter()
        .map(|result| SuggestionItem {
            url: result.url.clone(),
            status: result.status,
            error: result.error.clone(),
            suggestions: state.corrector.suggest(result, &known),
        })
        .collect();

    Ok(Json(SuggestResponse { items }))
}

/// Applies corrections to source files, one backup per written file.
///
/// # Endpoint
///
/// `POST /api/corrections/apply`
///
/// # Batch Processing
///
/// Items are processed in order and independently. A failed item does not
/// stop the rest; its error is returned in place of the result.
///
/// # Request Body
///
/// ```json
/// {
///   "corrections": [
///     {
///       "original_url": "/servces",
///       "suggested_url": "/services",
///       "file_path": "app/page.tsx",
///       "correction_type": "similar"
///     }
///   ]
/// }
/// ```
pub async fn apply_handler(
    State(state): State<AppState>,
    Json(payload): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    payload.validate()?;

    let total = payload.corrections.len();
    let mut items = Vec::with_capacity(total);
    let (mut applied, mut unchanged, mut failed) = (0, 0, 0);

    for item in payload.corrections {
        let suggestion = CorrectionSuggestion::new(
            item.original_url.clone(),
            item.suggested_url,
            item.correction_type,
            "Requested through the API",
        );

        match state
            .corrector
            .apply(&suggestion, &item.file_path, item.audit_id)
            .await
        {
            Ok(result) => {
                if result.applied {
                    applied += 1;
                } else {
                    unchanged += 1;
                }
                items.push(ApplyResultItem::Done(result));
            }
            Err(err) => {
                failed += 1;
                items.push(ApplyResultItem::Error {
                    original_url: item.original_url,
                    file_path: item.file_path,
                    error: err.to_error_info(),
                });
            }
        }
    }

    Ok(Json(ApplyResponse {
        summary: ApplySummary {
            total,
            applied,
            unchanged,
            failed,
        },
        items,
    }))
}

/// Restores the file saved under `rollback_id`.
///
/// # Endpoint
///
/// `POST /api/corrections/{rollback_id}/rollback`
///
/// # Errors
///
/// - 400 for a malformed id
/// - 404 if no backup exists
/// - 409 if the correction was already rolled back
pub async fn rollback_handler(
    State(state): State<AppState>,
    Path(rollback_id): Path<String>,
) -> Result<Json<RollbackOutcome>, AppError> {
    Ok(Json(state.corrector.rollback(&rollback_id).await?))
}

/// Lists backups, newest first.
///
/// # Endpoint
///
/// `GET /api/corrections/backups`
pub async fn list_backups_handler(
    State(state): State<AppState>,
) -> Result<Json<BackupListResponse>, AppError> {
    let items = state.corrector.list_backups().await?;
    Ok(Json(BackupListResponse {
        total: items.len(),
        items,
    }))
}

/// Deletes the oldest backups beyond the retention count.
///
/// # Endpoint
///
/// `POST /api/corrections/backups/prune`
pub async fn prune_backups_handler(
    State(state): State<AppState>,
    Json(payload): Json<PruneRequest>,
) -> Result<Json<PruneResponse>, AppError> {
    payload.validate()?;
    let removed = state.corrector.prune_backups(payload.retention).await?;
    Ok(Json(PruneResponse { removed }))
}

/// Ledger of applied corrections, newest first.
///
/// # Endpoint
///
/// `GET /api/corrections?limit=50`
pub async fn correction_history_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<CorrectionHistoryResponse>, AppError> {
    let items = state.corrector.history(params.clamped(50, 500)).await?;
    Ok(Json(CorrectionHistoryResponse { items }))
}
