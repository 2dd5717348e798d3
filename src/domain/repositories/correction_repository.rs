//! Repository trait for applied corrections.

use chrono::{DateTime, Utc};

use crate::domain::entities::AppliedCorrection;
use crate::error::AppError;
use async_trait::async_trait;

/// Ledger of corrections written to source files.
///
/// Every row references the rollback id of the backup taken before the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CorrectionRepository: Send + Sync {
    /// Records an applied correction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the rollback id is already recorded.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, correction: AppliedCorrection) -> Result<(), AppError>;

    /// Finds a correction by its rollback id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find(&self, rollback_id: &str) -> Result<Option<AppliedCorrection>, AppError>;

    /// Marks a correction as rolled back.
    ///
    /// Returns `Ok(false)` if no correction has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn mark_rolled_back(
        &self,
        rollback_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Lists corrections, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self, limit: i64) -> Result<Vec<AppliedCorrection>, AppError>;
}
