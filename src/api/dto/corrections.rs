//! DTOs for correction endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{
    AppliedCorrection, BackupManifest, CorrectionResult, CorrectionSuggestion, CorrectionType,
    LinkStatus,
};
use crate::error::ErrorInfo;

/// URLs to check and propose fixes for.
#[derive(Debug, Deserialize, Validate)]
pub struct SuggestRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 URLs per request"))]
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub items: Vec<SuggestionItem>,
}

/// Verdict for one URL together with its ranked fixes.
#[derive(Debug, Serialize)]
pub struct SuggestionItem {
    pub url: String,
    pub status: LinkStatus,
    pub error: Option<String>,
    pub suggestions: Vec<CorrectionSuggestion>,
}

/// Corrections to write to source files, applied in order.
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(min = 1, max = 50))]
    #[validate(nested)]
    pub corrections: Vec<ApplyItem>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApplyItem {
    #[validate(length(min = 1, max = 2048))]
    pub original_url: String,

    #[validate(length(min = 1, max = 2048))]
    pub suggested_url: String,

    /// Path relative to the audit root.
    #[validate(length(min = 1, max = 1024))]
    pub file_path: String,

    pub correction_type: CorrectionType,

    pub audit_id: Option<i64>,
}

/// Batch result, one item per requested correction.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub summary: ApplySummary,
    pub items: Vec<ApplyResultItem>,
}

/// Uses untagged enum for cleaner JSON structure (no discriminator field).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApplyResultItem {
    Done(CorrectionResult),
    Error {
        original_url: String,
        file_path: String,
        error: ErrorInfo,
    },
}

#[derive(Debug, Serialize)]
pub struct ApplySummary {
    pub total: usize,
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct BackupListResponse {
    pub total: usize,
    pub items: Vec<BackupManifest>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PruneRequest {
    /// Backups to keep; the configured `BACKUP_RETENTION` when absent.
    #[validate(range(max = 10000))]
    pub retention: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PruneResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct CorrectionHistoryResponse {
    pub items: Vec<AppliedCorrection>,
}
