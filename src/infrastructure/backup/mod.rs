//! Pre-correction backups and rollback restores.

pub mod fs_store;
pub mod store;

pub use fs_store::{FsBackupStore, sha256_hex};
pub use store::{BackupError, BackupStore};

#[cfg(test)]
pub use store::MockBackupStore;
