//! DTOs for link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{AuditSummary, BrokenLink, ValidationResult};

/// Broken links found by the most recent run.
#[derive(Debug, Serialize)]
pub struct BrokenLinksResponse {
    pub audit_id: Option<i64>,
    pub checked_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub items: Vec<BrokenLink>,
}

/// Ad-hoc batch of URLs to check.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 URLs per request"))]
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub summary: AuditSummary,
    pub results: Vec<ValidationResult>,
    /// URLs left unchecked because the execution budget ran out.
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub url: String,
    pub items: Vec<ValidationResult>,
}
