//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod audits;
pub mod corrections;
pub mod health;
pub mod links;
pub mod maintenance;
pub mod monitoring;

pub use audits::{
    audit_report_handler, get_audit_handler, health_metrics_handler, list_audits_handler,
};
pub use corrections::{
    apply_handler, correction_history_handler, list_backups_handler, prune_backups_handler,
    rollback_handler, suggest_handler,
};
pub use health::health_handler;
pub use links::{broken_links_handler, link_history_handler, validate_links_handler};
pub use maintenance::run_maintenance_handler;
pub use monitoring::{
    monitoring_status_handler, start_monitoring_handler, stop_monitoring_handler,
};
