//! Audit run report and health metric entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::correction::{CorrectionResult, CorrectionSuggestion};
use super::scanned_link::ScannedLink;
use super::validation::{LinkStatus, ValidationResult};

/// What started a maintenance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditTrigger {
    Manual,
    Scheduled,
    Cron,
}

impl AuditTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTrigger::Manual => "manual",
            AuditTrigger::Scheduled => "scheduled",
            AuditTrigger::Cron => "cron",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(AuditTrigger::Manual),
            "scheduled" => Some(AuditTrigger::Scheduled),
            "cron" => Some(AuditTrigger::Cron),
            _ => None,
        }
    }
}

/// Pipeline phase, used to attribute errors and skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditPhase {
    Scan,
    Validate,
    Correct,
    Persist,
    Report,
    Alert,
}

impl AuditPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditPhase::Scan => "scan",
            AuditPhase::Validate => "validate",
            AuditPhase::Correct => "correct",
            AuditPhase::Persist => "persist",
            AuditPhase::Report => "report",
            AuditPhase::Alert => "alert",
        }
    }
}

/// Error raised by one phase; the run continues with the remaining phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseError {
    pub phase: AuditPhase,
    pub message: String,
}

/// Aggregated counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub files_scanned: usize,
    pub links_found: usize,
    pub unique_urls: usize,
    pub valid: usize,
    pub broken: usize,
    pub redirects: usize,
    pub timeouts: usize,
    pub unknown: usize,
    /// URLs not checked because the execution budget ran out.
    pub skipped: usize,
    pub suggestions: usize,
    pub corrections_applied: usize,
    pub average_response_ms: u64,
}

impl AuditSummary {
    /// Tallies validation results into status counters.
    pub fn record_results(&mut self, results: &[ValidationResult]) {
        let mut total_ms = 0u64;
        let mut timed = 0u64;

        for result in results {
            match result.status {
                LinkStatus::Valid => self.valid += 1,
                LinkStatus::Broken => self.broken += 1,
                LinkStatus::Redirect => self.redirects += 1,
                LinkStatus::Timeout => self.timeouts += 1,
                LinkStatus::Unknown => self.unknown += 1,
            }
            if result.response_time_ms > 0 {
                total_ms += result.response_time_ms;
                timed += 1;
            }
        }

        self.average_response_ms = if timed == 0 { 0 } else { total_ms / timed };
    }

    /// Number of URLs that received a verdict.
    pub fn checked(&self) -> usize {
        self.valid + self.broken + self.redirects + self.timeouts + self.unknown
    }

    /// Percentage of checked URLs that resolve (valid or redirect), 100 when nothing was checked.
    pub fn health_score(&self) -> f64 {
        let checked = self.checked();
        if checked == 0 {
            return 100.0;
        }
        let healthy = (self.valid + self.redirects) as f64;
        (healthy / checked as f64 * 1000.0).round() / 10.0
    }
}

/// A broken URL together with every place it appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub result: ValidationResult,
    pub occurrences: Vec<ScannedLink>,
}

/// Full output of one maintenance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Assigned by storage; `None` until persisted.
    pub id: Option<i64>,
    pub trigger: AuditTrigger,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub summary: AuditSummary,
    pub health_score: f64,
    pub broken: Vec<BrokenLink>,
    pub suggestions: Vec<CorrectionSuggestion>,
    pub corrections: Vec<CorrectionResult>,
    pub skipped_phases: Vec<AuditPhase>,
    pub errors: Vec<PhaseError>,
    pub alert_sent: bool,
}

impl MaintenanceReport {
    pub fn new(trigger: AuditTrigger, dry_run: bool) -> Self {
        Self {
            id: None,
            trigger,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
            summary: AuditSummary::default(),
            health_score: 100.0,
            broken: Vec::new(),
            suggestions: Vec::new(),
            corrections: Vec::new(),
            skipped_phases: Vec::new(),
            errors: Vec::new(),
            alert_sent: false,
        }
    }

    pub fn record_error(&mut self, phase: AuditPhase, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(phase = ?phase, error = %message, "Audit phase failed");
        self.errors.push(PhaseError { phase, message });
    }

    pub fn skip_phase(&mut self, phase: AuditPhase) {
        if !self.skipped_phases.contains(&phase) {
            self.skipped_phases.push(phase);
        }
    }

    /// Stamps completion time and derived fields.
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.health_score = self.summary.health_score();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Compact row listing a past run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRunSummary {
    pub id: i64,
    pub trigger: AuditTrigger,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub health_score: f64,
    pub broken: usize,
    pub corrections_applied: usize,
    pub error_count: usize,
}

impl AuditRunSummary {
    pub fn from_report(id: i64, report: &MaintenanceReport) -> Self {
        Self {
            id,
            trigger: report.trigger,
            dry_run: report.dry_run,
            started_at: report.started_at,
            duration_ms: report.duration_ms,
            health_score: report.health_score,
            broken: report.summary.broken,
            corrections_applied: report.summary.corrections_applied,
            error_count: report.errors.len(),
        }
    }
}

/// One data point of link health over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetric {
    pub audit_id: Option<i64>,
    pub recorded_at: DateTime<Utc>,
    pub total_links: usize,
    pub broken_links: usize,
    pub health_score: f64,
    pub average_response_ms: u64,
}

impl HealthMetric {
    pub fn from_report(report: &MaintenanceReport) -> Self {
        Self {
            audit_id: report.id,
            recorded_at: report.finished_at.unwrap_or_else(Utc::now),
            total_links: report.summary.unique_urls,
            broken_links: report.summary.broken,
            health_score: report.health_score,
            average_response_ms: report.summary.average_response_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: LinkStatus, ms: u64) -> ValidationResult {
        let mut r = ValidationResult::local("https://x.test".to_string(), status, None);
        r.response_time_ms = ms;
        r
    }

    #[test]
    fn test_summary_counts_and_average() {
        let mut summary = AuditSummary::default();
        summary.record_results(&[
            result(LinkStatus::Valid, 100),
            result(LinkStatus::Valid, 0),
            result(LinkStatus::Broken, 300),
            result(LinkStatus::Redirect, 200),
            result(LinkStatus::Timeout, 0),
        ]);

        assert_eq!(summary.valid, 2);
        assert_eq!(summary.broken, 1);
        assert_eq!(summary.redirects, 1);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.checked(), 5);
        assert_eq!(summary.average_response_ms, 200);
    }

    #[test]
    fn test_health_score() {
        let mut summary = AuditSummary::default();
        assert_eq!(summary.health_score(), 100.0);

        summary.valid = 2;
        summary.redirects = 1;
        summary.broken = 1;
        assert_eq!(summary.health_score(), 75.0);
    }

    #[test]
    fn test_report_error_and_skip_tracking() {
        let mut report = MaintenanceReport::new(AuditTrigger::Manual, false);
        report.record_error(AuditPhase::Persist, "db down");
        report.skip_phase(AuditPhase::Correct);
        report.skip_phase(AuditPhase::Correct);
        report.finish();

        assert!(report.has_errors());
        assert_eq!(report.skipped_phases, vec![AuditPhase::Correct]);
        assert!(report.finished_at.is_some());
    }
}
