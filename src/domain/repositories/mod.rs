//! Repository trait definitions for the domain layer.
//!
//! Traits define the storage contract; implementations live in
//! `crate::infrastructure::persistence` (PostgreSQL and in-memory). Mock
//! implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ScanRepository`] - Scanned links and validation history
//! - [`CorrectionRepository`] - Applied corrections and rollbacks
//! - [`AuditRepository`] - Run reports and health metrics

pub mod audit_repository;
pub mod correction_repository;
pub mod scan_repository;

pub use audit_repository::AuditRepository;
pub use correction_repository::CorrectionRepository;
pub use scan_repository::ScanRepository;

#[cfg(test)]
pub use audit_repository::MockAuditRepository;
#[cfg(test)]
pub use correction_repository::MockCorrectionRepository;
#[cfg(test)]
pub use scan_repository::MockScanRepository;
