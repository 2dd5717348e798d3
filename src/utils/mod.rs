//! Shared helpers: URL canonicalization, string similarity, rollback ids,
//! atomic file writes.

pub mod atomic_write;
pub mod rollback_id;
pub mod similarity;
pub mod url_normalizer;
