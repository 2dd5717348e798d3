//! Application layer services implementing the audit pipeline.
//!
//! Services consume repository and infrastructure traits and expose the
//! operations used by HTTP handlers, the scheduler and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::scanner::ScannerService`] - Link extraction from source files
//! - [`services::validator::ValidatorService`] - Batched link checks
//! - [`services::corrector::CorrectorService`] - Suggestions, fixes and rollbacks
//! - [`services::maintenance::MaintenanceService`] - Full audit runs
//! - [`services::monitor::MonitorService`] - Scheduled runs
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
