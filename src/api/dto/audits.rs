//! DTOs for audit history endpoints.

use serde::Serialize;

use crate::api::dto::pagination::PaginationMeta;
use crate::domain::entities::{AuditRunSummary, HealthMetric};

/// Paginated list of past maintenance runs.
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<AuditRunSummary>,
}

/// Link health time series, newest first.
#[derive(Debug, Serialize)]
pub struct HealthMetricsResponse {
    pub total: usize,
    pub items: Vec<HealthMetric>,
}
