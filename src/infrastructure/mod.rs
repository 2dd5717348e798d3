//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for persistence, caching, outbound HTTP, file
//! backups and alert delivery.
//!
//! # Modules
//!
//! - [`backup`] - Filesystem backups enabling rollback of corrections
//! - [`cache`] - Validation result cache (Redis and no-op implementations)
//! - [`http`] - Link probing over HTTP(S)
//! - [`notify`] - Alert notifiers (log, webhook)
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod backup;
pub mod cache;
pub mod http;
pub mod notify;
pub mod persistence;
