//! Maintenance pipeline: scan, validate, correct, persist, report, alert.
//!
//! A run never aborts half-way. Each phase records its failure in the report
//! and the next phase continues with whatever data is available.

use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::services::corrector::CorrectorService;
use crate::application::services::scanner::ScannerService;
use crate::application::services::validator::ValidatorService;
use crate::config::Config;
use crate::domain::entities::{
    AuditPhase, AuditRunSummary, AuditTrigger, BrokenLink, CorrectionSuggestion, HealthMetric,
    LinkStatus, MaintenanceReport, ScannedLink, ValidationResult,
};
use crate::domain::repositories::{AuditRepository, ScanRepository};
use crate::error::AppError;
use crate::infrastructure::notify::{Alert, Notifier};
use crate::utils::url_normalizer::canonical_key;

const ALERT_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct MaintenanceSettings {
    pub max_execution: Duration,
    /// Correction is skipped when less than this remains of `max_execution`.
    pub correction_min_budget: Duration,
    pub auto_correct: bool,
    pub auto_correct_min_confidence: f64,
    pub alert_broken_threshold: usize,
    pub alert_min_health: f64,
}

impl MaintenanceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_execution: Duration::from_secs(config.max_execution_secs),
            correction_min_budget: Duration::from_secs(config.correction_min_budget_secs),
            auto_correct: config.auto_correct,
            auto_correct_min_confidence: config.auto_correct_min_confidence,
            alert_broken_threshold: config.alert_broken_threshold,
            alert_min_health: config.alert_min_health,
        }
    }
}

/// Per-run overrides.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub trigger: AuditTrigger,
    pub dry_run: bool,
    /// Overrides the configured `AUTO_CORRECT` for this run.
    pub auto_correct: Option<bool>,
}

impl RunOptions {
    pub fn new(trigger: AuditTrigger) -> Self {
        Self {
            trigger,
            dry_run: false,
            auto_correct: None,
        }
    }
}

pub struct MaintenanceService {
    scanner: ScannerService,
    validator: ValidatorService,
    corrector: Arc<CorrectorService>,
    scans: Arc<dyn ScanRepository>,
    audits: Arc<dyn AuditRepository>,
    notifiers: Vec<Arc<dyn Notifier>>,
    settings: MaintenanceSettings,
    running: Mutex<()>,
}

impl MaintenanceService {
    pub fn new(
        scanner: ScannerService,
        validator: ValidatorService,
        corrector: Arc<CorrectorService>,
        scans: Arc<dyn ScanRepository>,
        audits: Arc<dyn AuditRepository>,
        notifiers: Vec<Arc<dyn Notifier>>,
        settings: MaintenanceSettings,
    ) -> Self {
        Self {
            scanner,
            validator,
            corrector,
            scans,
            audits,
            notifiers,
            settings,
            running: Mutex::new(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Executes one full maintenance run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if another run is in progress. Phase
    /// failures are reported inside the returned report, not as errors.
    #[tracing::instrument(skip(self), fields(trigger = options.trigger.as_str(), dry_run = options.dry_run))]
    pub async fn run(&self, options: RunOptions) -> Result<MaintenanceReport, AppError> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(AppError::conflict(
                "A maintenance run is already in progress",
                json!({}),
            ));
        };

        let deadline = Instant::now() + self.settings.max_execution;
        let mut report = MaintenanceReport::new(options.trigger, options.dry_run);
        tracing::info!("Maintenance run started");

        let links = self.scan_phase(&mut report).await;
        let results = self.validate_phase(&mut report, &links, deadline).await;
        report.broken = broken_links(&results, &links);

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining < self.settings.correction_min_budget {
            tracing::warn!(
                remaining_ms = remaining.as_millis() as u64,
                "Execution budget too low, skipping corrections"
            );
            report.skip_phase(AuditPhase::Correct);
        } else {
            let auto_correct = options.auto_correct.unwrap_or(self.settings.auto_correct);
            self.correct_phase(&mut report, &results, auto_correct && !options.dry_run)
                .await;
        }

        report.finish();
        self.persist_phase(&mut report, &links, &results).await;
        self.report_phase(&report);
        self.alert_phase(&mut report).await;

        Ok(report)
    }

    async fn scan_phase(&self, report: &mut MaintenanceReport) -> Vec<ScannedLink> {
        match self.scanner.scan().await {
            Ok(outcome) => {
                report.summary.files_scanned = outcome.files_scanned;
                report.summary.links_found = outcome.links.len();
                outcome.links
            }
            Err(e) => {
                report.record_error(AuditPhase::Scan, e.to_string());
                Vec::new()
            }
        }
    }

    async fn validate_phase(
        &self,
        report: &mut MaintenanceReport,
        links: &[ScannedLink],
        deadline: Instant,
    ) -> Vec<ValidationResult> {
        let batch = self.validator.validate(links, Some(deadline)).await;

        report.summary.unique_urls = batch.results.len() + batch.skipped.len();
        report.summary.skipped = batch.skipped.len();
        report.summary.record_results(&batch.results);

        if !batch.skipped.is_empty() {
            report.record_error(
                AuditPhase::Validate,
                format!(
                    "Execution budget exhausted, {} URLs not checked",
                    batch.skipped.len()
                ),
            );
        }

        batch.results
    }

    async fn correct_phase(
        &self,
        report: &mut MaintenanceReport,
        results: &[ValidationResult],
        apply: bool,
    ) {
        let mut known: Vec<String> = match self.scans.known_good_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                report.record_error(AuditPhase::Correct, e.to_string());
                Vec::new()
            }
        };
        known.extend(
            results
                .iter()
                .filter(|r| r.status == LinkStatus::Valid)
                .map(|r| r.url.clone()),
        );

        let mut suggested = Vec::new();
        let mut planned: Vec<(CorrectionSuggestion, String)> = Vec::new();
        for broken in &report.broken {
            let suggestions = self.corrector.suggest(&broken.result, &known);
            if let Some(top) = suggestions.first()
                && top.confidence >= self.settings.auto_correct_min_confidence
            {
                let mut seen = BTreeSet::new();
                for occurrence in &broken.occurrences {
                    if !seen.insert((occurrence.source_file.as_str(), occurrence.url.as_str())) {
                        continue;
                    }
                    let suggestion =
                        self.suggestion_for_spelling(&broken.result, top, &occurrence.url, &known);
                    planned.push((suggestion, occurrence.source_file.clone()));
                }
            }
            suggested.extend(suggestions);
        }
        // Redirects are not broken, but a redirect target is still a fix worth listing.
        for result in results.iter().filter(|r| r.status == LinkStatus::Redirect) {
            suggested.extend(self.corrector.suggest(result, &known));
        }
        report.suggestions = suggested;
        report.summary.suggestions = report.suggestions.len();

        if !apply {
            return;
        }

        for (suggestion, file) in planned {
            match self.corrector.apply(&suggestion, &file, None).await {
                Ok(result) => {
                    if result.applied {
                        report.summary.corrections_applied += 1;
                    }
                    report.corrections.push(result);
                }
                Err(e) => report.record_error(AuditPhase::Correct, format!("{file}: {e}")),
            }
        }
    }

    /// Occurrences sharing a canonical URL may be spelled differently in source;
    /// each spelling is rewritten by its own suggestion.
    fn suggestion_for_spelling(
        &self,
        result: &ValidationResult,
        top: &CorrectionSuggestion,
        spelling: &str,
        known: &[String],
    ) -> CorrectionSuggestion {
        if spelling == top.original_url {
            return top.clone();
        }
        let variant = ValidationResult {
            url: spelling.to_string(),
            ..result.clone()
        };
        self.corrector
            .suggest(&variant, known)
            .into_iter()
            .find(|s| s.confidence >= self.settings.auto_correct_min_confidence)
            .unwrap_or_else(|| CorrectionSuggestion {
                original_url: spelling.to_string(),
                ..top.clone()
            })
    }

    async fn persist_phase(
        &self,
        report: &mut MaintenanceReport,
        links: &[ScannedLink],
        results: &[ValidationResult],
    ) {
        let id = match self.audits.save_report(report).await {
            Ok(id) => id,
            Err(e) => {
                report.record_error(AuditPhase::Persist, e.to_string());
                return;
            }
        };
        report.id = Some(id);

        if let Err(e) = self.scans.save_links(id, links).await {
            report.record_error(AuditPhase::Persist, e.to_string());
        }
        if let Err(e) = self.scans.append_results(Some(id), results).await {
            report.record_error(AuditPhase::Persist, e.to_string());
        }
        if let Err(e) = self.audits.record_health(HealthMetric::from_report(report)).await {
            report.record_error(AuditPhase::Persist, e.to_string());
        }
    }

    fn report_phase(&self, report: &MaintenanceReport) {
        metrics::counter!("maintenance_runs_total", "trigger" => report.trigger.as_str())
            .increment(1);
        metrics::gauge!("link_health_score").set(report.health_score);
        metrics::gauge!("broken_links").set(report.summary.broken as f64);

        tracing::info!(
            audit_id = ?report.id,
            files = report.summary.files_scanned,
            links = report.summary.links_found,
            unique = report.summary.unique_urls,
            broken = report.summary.broken,
            suggestions = report.summary.suggestions,
            corrections = report.summary.corrections_applied,
            health = report.health_score,
            duration_ms = report.duration_ms,
            errors = report.errors.len(),
            "Maintenance run finished"
        );
    }

    async fn alert_phase(&self, report: &mut MaintenanceReport) {
        let reasons = self.alert_reasons(report);
        if reasons.is_empty() {
            return;
        }

        let alert = Alert {
            subject: format!(
                "Link audit: {} broken links, health {:.1}%",
                report.summary.broken, report.health_score
            ),
            audit_id: report.id,
            health_score: report.health_score,
            broken_links: report.summary.broken,
            reasons,
            sample: report
                .broken
                .iter()
                .take(ALERT_SAMPLE_SIZE)
                .map(|b| b.result.url.clone())
                .collect(),
        };

        let mut delivered = false;
        let mut logged = false;
        for notifier in &self.notifiers {
            if notifier.notify(&alert).await {
                if notifier.is_delivery() {
                    delivered = true;
                } else {
                    logged = true;
                }
            } else {
                tracing::warn!(notifier = notifier.name(), "Alert delivery failed");
                report.record_error(
                    AuditPhase::Alert,
                    format!("{} notifier failed to deliver the alert", notifier.name()),
                );
            }
        }

        let has_delivery = self.notifiers.iter().any(|n| n.is_delivery());
        let sent = if has_delivery { delivered } else { logged };
        if !sent {
            if self.notifiers.is_empty() {
                report.record_error(AuditPhase::Alert, "No notifier configured");
            }
            return;
        }

        report.alert_sent = true;
        if let Some(id) = report.id
            && let Err(e) = self.audits.mark_alert_sent(id).await
        {
            report.record_error(AuditPhase::Alert, e.to_string());
        }
    }

    fn alert_reasons(&self, report: &MaintenanceReport) -> Vec<String> {
        let mut reasons = Vec::new();
        if report.summary.broken > self.settings.alert_broken_threshold {
            reasons.push(format!(
                "{} broken links (threshold {})",
                report.summary.broken, self.settings.alert_broken_threshold
            ));
        }
        if report.health_score < self.settings.alert_min_health {
            reasons.push(format!(
                "Health score {:.1}% below {:.1}%",
                report.health_score, self.settings.alert_min_health
            ));
        }
        reasons
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub async fn get_report(&self, id: i64) -> Result<MaintenanceReport, AppError> {
        self.audits
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit report not found", json!({ "id": id })))
    }

    pub async fn latest_report(&self) -> Result<Option<MaintenanceReport>, AppError> {
        self.audits.latest_report().await
    }

    /// Returns one page of runs and the total count.
    pub async fn list_runs(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<AuditRunSummary>, i64), AppError> {
        let (runs, total) = tokio::try_join!(
            self.audits.list_runs(offset, limit),
            self.audits.count_runs()
        )?;
        Ok((runs, total))
    }

    pub async fn recent_health(&self, limit: i64) -> Result<Vec<HealthMetric>, AppError> {
        self.audits.recent_health(limit).await
    }
}

/// Groups broken and timed-out results with the scanned occurrences of their URL.
fn broken_links(results: &[ValidationResult], links: &[ScannedLink]) -> Vec<BrokenLink> {
    let mut by_key: HashMap<String, Vec<&ScannedLink>> = HashMap::new();
    for link in links {
        by_key.entry(canonical_key(&link.url)).or_default().push(link);
    }

    results
        .iter()
        .filter(|r| matches!(r.status, LinkStatus::Broken | LinkStatus::Timeout))
        .map(|r| BrokenLink {
            result: r.clone(),
            occurrences: by_key
                .get(&canonical_key(&r.url))
                .map(|found| found.iter().map(|l| (*l).clone()).collect())
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::corrector::CorrectorSettings;
    use crate::application::services::validator::ValidatorSettings;
    use crate::domain::repositories::{CorrectionRepository, MockAuditRepository};
    use crate::infrastructure::backup::FsBackupStore;
    use crate::infrastructure::cache::NullCache;
    use crate::infrastructure::http::MockLinkProbe;
    use crate::infrastructure::notify::{LogNotifier, MockNotifier};
    use crate::infrastructure::persistence::MemoryStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("app/services")).unwrap();
        std::fs::write(root.join("app/services/page.tsx"), "export default function P() {}\n")
            .unwrap();
        std::fs::write(
            root.join("app/page.tsx"),
            "<Link href=\"/services\">Services</Link>\n<a href=\"/Services\">More</a>\n",
        )
        .unwrap();
        dir
    }

    fn config(root: &Path) -> Config {
        let mut config = Config::defaults(root);
        config.validator_batch_delay_ms = 0;
        config.validator_retry_delay_ms = 0;
        config.validator_max_retries = 0;
        config.correction_min_budget_secs = 0;
        config
    }

    fn service_with(
        config: &Config,
        store: Arc<MemoryStore>,
        audits: Arc<dyn AuditRepository>,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> MaintenanceService {
        let cache = Arc::new(NullCache::new());
        let validator = ValidatorService::new(
            Arc::new(MockLinkProbe::new()),
            cache.clone(),
            ValidatorSettings::from_config(config),
        );
        let corrector = Arc::new(CorrectorService::new(
            Arc::new(FsBackupStore::new(config.backup_dir.clone())),
            store.clone(),
            cache,
            CorrectorSettings::from_config(config),
        ));
        MaintenanceService::new(
            ScannerService::new(config),
            validator,
            corrector,
            store,
            audits,
            notifiers,
            MaintenanceSettings::from_config(config),
        )
    }

    fn service(config: &Config, notifiers: Vec<Arc<dyn Notifier>>) -> (MaintenanceService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (service_with(config, store.clone(), store.clone(), notifiers), store)
    }

    fn delivering_notifier(times: usize) -> Arc<dyn Notifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_name().return_const("mock");
        notifier.expect_is_delivery().return_const(true);
        notifier.expect_notify().times(times).returning(|_| true);
        Arc::new(notifier)
    }

    #[tokio::test]
    async fn test_dry_run_suggests_without_writing() {
        let dir = project();
        let config = config(dir.path());
        let (service, store) = service(&config, vec![delivering_notifier(1)]);

        let mut options = RunOptions::new(AuditTrigger::Manual);
        options.dry_run = true;
        options.auto_correct = Some(true);
        let report = service.run(options).await.unwrap();

        assert_eq!(report.summary.files_scanned, 2);
        assert_eq!(report.summary.links_found, 2);
        assert_eq!(report.summary.broken, 1);
        assert_eq!(report.broken[0].result.url, "/Services");
        assert_eq!(report.broken[0].occurrences[0].source_line, 2);
        assert_eq!(report.suggestions[0].suggested_url, "/services");
        assert!(report.corrections.is_empty());
        assert!(report.alert_sent);

        let content = std::fs::read_to_string(dir.path().join("app/page.tsx")).unwrap();
        assert!(content.contains("href=\"/Services\""));

        let stored = store.get_report(report.id.unwrap()).await.unwrap().unwrap();
        assert!(stored.alert_sent);
    }

    #[tokio::test]
    async fn test_auto_correct_applies_high_confidence_fix() {
        let dir = project();
        let mut config = config(dir.path());
        config.auto_correct = true;
        let (service, store) = service(&config, vec![delivering_notifier(1)]);

        let report = service.run(RunOptions::new(AuditTrigger::Cron)).await.unwrap();

        assert_eq!(report.summary.corrections_applied, 1);
        let correction = &report.corrections[0];
        assert!(correction.applied);
        assert_eq!(correction.file_path, "app/page.tsx");

        let content = std::fs::read_to_string(dir.path().join("app/page.tsx")).unwrap();
        assert!(!content.contains("/Services"));

        let rollback_id = correction.rollback_id.clone().unwrap();
        assert!(store.find(&rollback_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_budget_skips_correction() {
        let dir = project();
        let mut config = config(dir.path());
        config.auto_correct = true;
        config.correction_min_budget_secs = config.max_execution_secs + 1;
        let (service, _) = service(&config, vec![delivering_notifier(1)]);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert_eq!(report.skipped_phases, vec![AuditPhase::Correct]);
        assert!(report.suggestions.is_empty());
        assert!(report.corrections.is_empty());
    }

    #[tokio::test]
    async fn test_healthy_site_raises_no_alert() {
        let dir = project();
        std::fs::write(dir.path().join("app/page.tsx"), "<Link href=\"/services\">x</Link>\n")
            .unwrap();
        let config = config(dir.path());
        let (service, _) = service(&config, vec![delivering_notifier(0)]);

        let report = service.run(RunOptions::new(AuditTrigger::Scheduled)).await.unwrap();

        assert_eq!(report.health_score, 100.0);
        assert!(!report.alert_sent);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_notifier_is_recorded_not_raised() {
        let dir = project();
        let config = config(dir.path());
        let mut notifier = MockNotifier::new();
        notifier.expect_name().return_const("webhook");
        notifier.expect_is_delivery().return_const(true);
        notifier.expect_notify().returning(|_| false);
        let (service, _) = service(&config, vec![Arc::new(notifier)]);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert!(!report.alert_sent);
        assert!(report.errors.iter().any(|e| e.phase == AuditPhase::Alert));
    }

    #[tokio::test]
    async fn test_failed_webhook_is_reported_despite_log() {
        let dir = project();
        let config = config(dir.path());
        let mut webhook = MockNotifier::new();
        webhook.expect_name().return_const("webhook");
        webhook.expect_is_delivery().return_const(true);
        webhook.expect_notify().times(1).returning(|_| false);
        let notifiers: Vec<Arc<dyn Notifier>> =
            vec![Arc::new(LogNotifier::new(None)), Arc::new(webhook)];
        let (service, store) = service(&config, notifiers);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert!(!report.alert_sent);
        let alert_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.phase == AuditPhase::Alert)
            .collect();
        assert_eq!(alert_errors.len(), 1);
        assert!(alert_errors[0].message.contains("webhook"));
        let stored = store.get_report(report.id.unwrap()).await.unwrap().unwrap();
        assert!(!stored.alert_sent);
    }

    #[tokio::test]
    async fn test_log_only_alert_counts_as_sent() {
        let dir = project();
        let config = config(dir.path());
        let (service, _) = service(&config, vec![Arc::new(LogNotifier::new(None))]);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert!(report.alert_sent);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_auto_correct_fixes_every_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("app/gone")).unwrap();
        std::fs::write(root.join("app/gone/page.tsx"), "export default function P() {}\n").unwrap();
        std::fs::write(root.join("app/a.tsx"), "<a href=\"/Gone/\">A</a>\n").unwrap();
        std::fs::write(root.join("app/b.tsx"), "<a href=\"/Gone\">B</a>\n").unwrap();
        std::fs::write(root.join("app/c.tsx"), "<a href=\"/gone\">C</a>\n").unwrap();
        let mut config = config(root);
        config.auto_correct = true;
        let (service, _) = service(&config, vec![delivering_notifier(1)]);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert_eq!(report.summary.broken, 1);
        assert_eq!(report.broken[0].occurrences.len(), 2);
        assert_eq!(report.summary.corrections_applied, 2);
        let a = std::fs::read_to_string(root.join("app/a.tsx")).unwrap();
        let b = std::fs::read_to_string(root.join("app/b.tsx")).unwrap();
        assert!(a.contains("href=\"/gone/\""));
        assert!(b.contains("href=\"/gone\""));
        assert!(!a.contains("/Gone") && !b.contains("/Gone"));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_run_going() {
        let dir = project();
        let config = config(dir.path());
        let mut audits = MockAuditRepository::new();
        audits.expect_save_report().returning(|_| {
            Err(AppError::internal("Database error", json!({})))
        });
        let store = Arc::new(MemoryStore::new());
        let service = service_with(&config, store, Arc::new(audits), vec![delivering_notifier(1)]);

        let report = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap();

        assert!(report.id.is_none());
        assert_eq!(report.errors[0].phase, AuditPhase::Persist);
        assert!(report.alert_sent);
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let dir = project();
        let config = config(dir.path());
        let (service, _) = service(&config, Vec::new());

        let _held = service.running.lock().await;
        assert!(service.is_running());
        let err = service.run(RunOptions::new(AuditTrigger::Manual)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[test]
    fn test_broken_links_groups_occurrences() {
        let links = vec![
            ScannedLink::new(
                "/gone/".to_string(),
                "a.tsx".to_string(),
                1,
                crate::domain::entities::LinkType::Internal,
                String::new(),
            ),
            ScannedLink::new(
                "/gone#x".to_string(),
                "b.tsx".to_string(),
                4,
                crate::domain::entities::LinkType::Internal,
                String::new(),
            ),
        ];
        let results = vec![
            ValidationResult::local("/gone/".to_string(), LinkStatus::Broken, None),
            ValidationResult::local("/ok".to_string(), LinkStatus::Valid, None),
        ];

        let broken = broken_links(&results, &links);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].occurrences.len(), 2);
    }
}
