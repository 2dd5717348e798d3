//! Filesystem backup store.
//!
//! Layout under the backup root:
//!
//! ```text
//! <backup_dir>/<rollback_id>/content        saved bytes
//! <backup_dir>/<rollback_id>/manifest.json  BackupManifest
//! ```
//!
//! The manifest is written last, so a directory without one is an
//! interrupted backup and is ignored by `list` and `restore`.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::store::{BackupError, BackupStore};
use crate::domain::entities::BackupManifest;
use crate::utils::atomic_write::write_atomic;
use crate::utils::rollback_id::validate_rollback_id;

const CONTENT_FILE: &str = "content";
const MANIFEST_FILE: &str = "manifest.json";

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// [`BackupStore`] keeping one directory per rollback id.
pub struct FsBackupStore {
    root: PathBuf,
}

impl FsBackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, rollback_id: &str) -> Result<PathBuf, BackupError> {
        validate_rollback_id(rollback_id)
            .map_err(|_| BackupError::InvalidId(rollback_id.to_string()))?;
        Ok(self.root.join(rollback_id))
    }

    async fn read_manifest(dir: &Path) -> Result<Option<BackupManifest>, BackupError> {
        match fs::read(dir.join(MANIFEST_FILE)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackupError::io(
                format!("Failed to read manifest in {}", dir.display()),
                e,
            )),
        }
    }
}

#[async_trait]
impl BackupStore for FsBackupStore {
    async fn create(
        &self,
        rollback_id: &str,
        original_path: &Path,
        content: &[u8],
    ) -> Result<BackupManifest, BackupError> {
        let dir = self.entry_dir(rollback_id)?;
        if fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(BackupError::AlreadyExists(rollback_id.to_string()));
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| BackupError::io("Failed to create backup directory", e))?;

        fs::write(dir.join(CONTENT_FILE), content)
            .await
            .map_err(|e| BackupError::io(format!("Failed to back up {}", original_path.display()), e))?;

        let manifest = BackupManifest {
            rollback_id: rollback_id.to_string(),
            original_path: original_path.to_string_lossy().into_owned(),
            sha256: sha256_hex(content),
            size: content.len() as u64,
            created_at: Utc::now(),
        };
        let encoded = serde_json::to_vec_pretty(&manifest)?;
        write_atomic(&dir.join(MANIFEST_FILE), &encoded)
            .await
            .map_err(|e| BackupError::io("Failed to write backup manifest", e))?;

        tracing::debug!(
            rollback_id,
            path = %original_path.display(),
            size = manifest.size,
            "Backup created"
        );
        Ok(manifest)
    }

    async fn restore(&self, rollback_id: &str) -> Result<BackupManifest, BackupError> {
        let dir = self.entry_dir(rollback_id)?;
        let manifest = Self::read_manifest(&dir)
            .await?
            .ok_or_else(|| BackupError::NotFound(rollback_id.to_string()))?;

        let saved = fs::read(dir.join(CONTENT_FILE))
            .await
            .map_err(|e| BackupError::io("Failed to read backup content", e))?;
        let saved_sum = sha256_hex(&saved);
        if saved_sum != manifest.sha256 {
            return Err(BackupError::ChecksumMismatch {
                rollback_id: rollback_id.to_string(),
                expected: manifest.sha256,
                actual: saved_sum,
            });
        }

        let target = PathBuf::from(&manifest.original_path);
        write_atomic(&target, &saved)
            .await
            .map_err(|e| BackupError::io(format!("Failed to restore {}", target.display()), e))?;

        let restored = fs::read(&target)
            .await
            .map_err(|e| BackupError::io("Failed to re-read restored file", e))?;
        let restored_sum = sha256_hex(&restored);
        if restored_sum != manifest.sha256 {
            return Err(BackupError::ChecksumMismatch {
                rollback_id: rollback_id.to_string(),
                expected: manifest.sha256,
                actual: restored_sum,
            });
        }

        tracing::info!(rollback_id, path = %target.display(), "Backup restored");
        Ok(manifest)
    }

    async fn list(&self) -> Result<Vec<BackupManifest>, BackupError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackupError::io("Failed to read backup directory", e)),
        };

        let mut manifests = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackupError::io("Failed to read backup directory", e))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match Self::read_manifest(&path).await {
                Ok(Some(manifest)) => manifests.push(manifest),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable backup"),
            }
        }

        manifests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.rollback_id.cmp(&a.rollback_id))
        });
        Ok(manifests)
    }

    async fn prune(&self, retention: usize) -> Result<usize, BackupError> {
        let manifests = self.list().await?;
        let mut removed = 0;

        for manifest in manifests.into_iter().skip(retention) {
            let dir = self.entry_dir(&manifest.rollback_id)?;
            match fs::remove_dir_all(&dir).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(rollback_id = %manifest.rollback_id, error = %e, "Failed to prune backup")
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, retention, "Pruned old backups");
        }
        Ok(removed)
    }

    async fn is_writable(&self) -> bool {
        fs::create_dir_all(&self.root).await.is_ok()
            && fs::metadata(&self.root)
                .await
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false)
    }
}
