//! Domain layer containing the audit entities and storage contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Links, validation results, corrections, reports
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Pure rules (link/status classification, confidence bands) live with the entities
//! - Orchestration lives in [`crate::application::services`]
//!
//! # Audit Flow
//!
//! 1. The scanner turns source files into [`entities::ScannedLink`]s
//! 2. The validator produces one [`entities::ValidationResult`] per unique URL
//! 3. The corrector proposes [`entities::CorrectionSuggestion`]s for broken links
//! 4. Applied fixes become [`entities::CorrectionResult`]s with a rollback id
//! 5. Everything is folded into a [`entities::MaintenanceReport`]

pub mod entities;
pub mod repositories;
