//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgScanRepository`] - Scanned links and append-only validation history
//! - [`PgCorrectionRepository`] - Applied corrections ledger
//! - [`PgAuditRepository`] - Run reports and health metrics
//! - [`MemoryStore`] - All of the above in process memory, used without a database

pub mod memory_store;
pub mod pg_audit_repository;
pub mod pg_correction_repository;
pub mod pg_scan_repository;

pub use memory_store::MemoryStore;
pub use pg_audit_repository::PgAuditRepository;
pub use pg_correction_repository::PgCorrectionRepository;
pub use pg_scan_repository::PgScanRepository;
