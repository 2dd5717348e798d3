//! Repository trait for scanned links and validation history.

use crate::domain::entities::{ScannedLink, ValidationResult};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage for scanner output and the append-only validation history.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgScanRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - In-process fallback
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Stores the links found by one scan.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn save_links(&self, audit_id: i64, links: &[ScannedLink]) -> Result<(), AppError>;

    /// Appends validation results. Existing rows are never updated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn append_results(
        &self,
        audit_id: Option<i64>,
        results: &[ValidationResult],
    ) -> Result<(), AppError>;

    /// Returns the most recent checks of a URL, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn url_history(&self, url: &str, limit: i64) -> Result<Vec<ValidationResult>, AppError>;

    /// URLs whose latest check was valid. Feeds the corrector's similarity search.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn known_good_urls(&self) -> Result<Vec<String>, AppError>;
}
