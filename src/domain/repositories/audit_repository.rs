//! Repository trait for audit history and health metrics.

use crate::domain::entities::{AuditRunSummary, HealthMetric, MaintenanceReport};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage for maintenance reports and the link health time series.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists a finished report and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn save_report(&self, report: &MaintenanceReport) -> Result<i64, AppError>;

    /// Loads a report by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn get_report(&self, id: i64) -> Result<Option<MaintenanceReport>, AppError>;

    /// Most recent report, if any run has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn latest_report(&self) -> Result<Option<MaintenanceReport>, AppError>;

    /// Lists runs newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_runs(&self, offset: i64, limit: i64) -> Result<Vec<AuditRunSummary>, AppError>;

    /// Total number of stored runs.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count_runs(&self) -> Result<i64, AppError>;

    /// Records that an alert was delivered for a stored report.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the report does not exist.
    async fn mark_alert_sent(&self, id: i64) -> Result<(), AppError>;

    /// Appends a health metric data point.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record_health(&self, metric: HealthMetric) -> Result<(), AppError>;

    /// Most recent health metrics, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn recent_health(&self, limit: i64) -> Result<Vec<HealthMetric>, AppError>;

    /// Cheap connectivity probe used by the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when storage is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
