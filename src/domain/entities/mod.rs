//! Core domain entities of the link audit pipeline.
//!
//! Entities are plain data structures; the pure rules attached to them
//! (link classification, status classification, confidence bands) live next
//! to the data they describe.
//!
//! # Entity Types
//!
//! - [`ScannedLink`] - A link found in a source file
//! - [`ValidationResult`] - Outcome of checking one URL
//! - [`CorrectionSuggestion`] / [`CorrectionResult`] - Proposed and applied fixes
//! - [`BackupManifest`] - Metadata of a file saved before a correction
//! - [`MaintenanceReport`] - Output of a full audit run

pub mod audit;
pub mod backup;
pub mod correction;
pub mod scanned_link;
pub mod validation;

pub use audit::{
    AuditPhase, AuditRunSummary, AuditSummary, AuditTrigger, BrokenLink, HealthMetric,
    MaintenanceReport, PhaseError,
};
pub use backup::BackupManifest;
pub use correction::{
    AppliedCorrection, CorrectionResult, CorrectionSuggestion, CorrectionType,
    SIMILAR_CONFIDENCE_CEILING,
};
pub use scanned_link::{LinkType, Priority, ScannedLink};
pub use validation::{LinkStatus, ProbeOutcome, ValidationResult};
