//! Backup manifest entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Describes one backed-up file. Written next to the saved bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub rollback_id: String,
    /// Path the bytes were read from and will be restored to.
    pub original_path: String,
    /// Lowercase hex SHA-256 of the saved bytes.
    pub sha256: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}
