//! HTML rendering of maintenance reports.

use askama::Template;
use askama_web::WebTemplate;

use crate::domain::entities::{AuditSummary, MaintenanceReport};

pub struct BrokenRow {
    pub url: String,
    pub status: String,
    pub detail: String,
    pub locations: Vec<String>,
}

pub struct SuggestionRow {
    pub original_url: String,
    pub suggested_url: String,
    pub correction_type: String,
    pub confidence: String,
    pub reasoning: String,
}

pub struct CorrectionRow {
    pub file_path: String,
    pub original_url: String,
    pub new_url: String,
    pub rollback_id: String,
    pub replacements: usize,
}

pub struct ErrorRow {
    pub phase: String,
    pub message: String,
}

/// Template for `templates/report.html`.
///
/// All values are pre-formatted so the template only prints strings.
#[derive(Template, WebTemplate)]
#[template(path = "report.html")]
pub struct ReportPage {
    pub title: String,
    pub trigger: String,
    pub started_at: String,
    pub duration: String,
    pub dry_run: bool,
    pub health: String,
    pub health_class: &'static str,
    pub summary: AuditSummary,
    pub broken: Vec<BrokenRow>,
    pub suggestions: Vec<SuggestionRow>,
    pub corrections: Vec<CorrectionRow>,
    pub skipped_phases: Vec<String>,
    pub errors: Vec<ErrorRow>,
    pub alert_sent: bool,
}

impl From<&MaintenanceReport> for ReportPage {
    fn from(report: &MaintenanceReport) -> Self {
        let health_class = if report.health_score >= 95.0 {
            "good"
        } else if report.health_score >= 80.0 {
            "warn"
        } else {
            "bad"
        };

        Self {
            title: match report.id {
                Some(id) => format!("Link audit #{id}"),
                None => "Link audit".to_string(),
            },
            trigger: report.trigger.as_str().to_string(),
            started_at: report.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            duration: format!("{:.1}s", report.duration_ms as f64 / 1000.0),
            dry_run: report.dry_run,
            health: format!("{:.1}%", report.health_score),
            health_class,
            summary: report.summary.clone(),
            broken: report
                .broken
                .iter()
                .map(|b| BrokenRow {
                    url: b.result.url.clone(),
                    status: b.result.status.as_str().to_string(),
                    detail: b.result.error.clone().unwrap_or_default(),
                    locations: b
                        .occurrences
                        .iter()
                        .map(|o| format!("{}:{}", o.source_file, o.source_line))
                        .collect(),
                })
                .collect(),
            suggestions: report
                .suggestions
                .iter()
                .map(|s| SuggestionRow {
                    original_url: s.original_url.clone(),
                    suggested_url: s.suggested_url.clone(),
                    correction_type: s.correction_type.as_str().to_string(),
                    confidence: format!("{:.0}%", s.confidence * 100.0),
                    reasoning: s.reasoning.clone(),
                })
                .collect(),
            corrections: report
                .corrections
                .iter()
                .filter(|c| c.applied)
                .map(|c| CorrectionRow {
                    file_path: c.file_path.clone(),
                    original_url: c.original_url.clone(),
                    new_url: c.new_url.clone(),
                    rollback_id: c.rollback_id.clone().unwrap_or_default(),
                    replacements: c.replacements,
                })
                .collect(),
            skipped_phases: report.skipped_phases.iter().map(|p| p.as_str().to_string()).collect(),
            errors: report
                .errors
                .iter()
                .map(|e| ErrorRow {
                    phase: e.phase.as_str().to_string(),
                    message: e.message.clone(),
                })
                .collect(),
            alert_sent: report.alert_sent,
        }
    }
}

/// Renders a report to an HTML string.
///
/// # Errors
///
/// Returns the template error if rendering fails.
pub fn render_report(report: &MaintenanceReport) -> Result<String, askama::Error> {
    ReportPage::from(report).render()
}
