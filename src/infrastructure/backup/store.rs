//! Backup storage abstraction and errors.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

use crate::domain::entities::BackupManifest;
use crate::error::AppError;

/// Errors raised while saving or restoring backups.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Invalid rollback id: {0}")]
    InvalidId(String),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Backup already exists: {0}")]
    AlreadyExists(String),

    #[error("Checksum mismatch for {rollback_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        rollback_id: String,
        expected: String,
        actual: String,
    },

    #[error("Corrupt backup manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackupError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<BackupError> for AppError {
    fn from(e: BackupError) -> Self {
        match e {
            BackupError::InvalidId(id) => {
                AppError::bad_request("Invalid rollback id", json!({"rollback_id": id}))
            }
            BackupError::NotFound(id) => {
                AppError::not_found("Backup not found", json!({"rollback_id": id}))
            }
            BackupError::AlreadyExists(id) => {
                AppError::conflict("Backup already exists", json!({"rollback_id": id}))
            }
            other => {
                tracing::error!(error = %other, "Backup storage error");
                AppError::internal("Backup storage error", json!({"reason": other.to_string()}))
            }
        }
    }
}

/// Saves file contents before a correction and puts them back on rollback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Saves `content` under `rollback_id`. Must complete before the original is touched.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::AlreadyExists`] if the id is taken, or an I/O error.
    async fn create(
        &self,
        rollback_id: &str,
        original_path: &Path,
        content: &[u8],
    ) -> Result<BackupManifest, BackupError>;

    /// Writes the saved bytes back to the original path and verifies their checksum.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NotFound`] for unknown ids and
    /// [`BackupError::ChecksumMismatch`] if the restored file does not match.
    async fn restore(&self, rollback_id: &str) -> Result<BackupManifest, BackupError>;

    /// Lists complete backups, newest first.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backup directory cannot be read.
    async fn list(&self) -> Result<Vec<BackupManifest>, BackupError>;

    /// Deletes all but the newest `retention` backups and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backup directory cannot be read.
    async fn prune(&self, retention: usize) -> Result<usize, BackupError>;

    /// True when the backup directory exists or can be created.
    async fn is_writable(&self) -> bool;
}
