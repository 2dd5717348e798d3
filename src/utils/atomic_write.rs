//! Atomic file replacement.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.link-audit.tmp"))
}

/// Replaces `target` with `bytes` via a sibling temp file and a rename.
///
/// Readers see either the old or the new content, never a partial write.
/// The temp file is removed if anything fails before the rename.
pub async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path(target);

    let result = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, target).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replaces_content_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("page.tsx");
        fs::write(&target, b"old").await.unwrap();

        write_atomic(&target, b"new content").await.unwrap();

        assert_eq!(fs::read(&target).await.unwrap(), b"new content");
        assert!(!temp_path(&target).exists());
    }

    #[tokio::test]
    async fn test_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("page.tsx");

        assert!(write_atomic(&target, b"x").await.is_err());
        assert!(!target.exists());
    }
}
