//! Business logic services for the application layer.

pub mod auth_service;
pub mod corrector;
pub mod maintenance;
pub mod monitor;
pub mod report;
pub mod route_resolver;
pub mod scanner;
pub mod validator;

pub use auth_service::AuthService;
pub use corrector::{CorrectorService, CorrectorSettings, RollbackOutcome};
pub use maintenance::{MaintenanceService, MaintenanceSettings, RunOptions};
pub use monitor::{MonitorService, MonitorStatus};
pub use report::{ReportPage, render_report};
pub use scanner::{ScanOutcome, ScannerService};
pub use validator::{ValidationBatch, ValidatorService, ValidatorSettings};
