//! In-process storage used when no database is configured.
//!
//! Implements every repository trait over plain collections guarded by a
//! single async lock. Data lives as long as the process; the server logs a
//! warning at startup when it falls back to this store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{
    AppliedCorrection, AuditRunSummary, HealthMetric, LinkStatus, MaintenanceReport, ScannedLink,
    ValidationResult,
};
use crate::domain::repositories::{AuditRepository, CorrectionRepository, ScanRepository};
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    next_audit_id: i64,
    reports: Vec<MaintenanceReport>,
    links: HashMap<i64, Vec<ScannedLink>>,
    results: Vec<ValidationResult>,
    corrections: Vec<AppliedCorrection>,
    health: Vec<HealthMetric>,
}

/// Memory-backed implementation of all repositories.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links saved for a run.
    pub async fn links_for(&self, audit_id: i64) -> Vec<ScannedLink> {
        self.inner
            .read()
            .await
            .links
            .get(&audit_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit.max(0)).unwrap_or(usize::MAX)
}

#[async_trait]
impl ScanRepository for MemoryStore {
    async fn save_links(&self, audit_id: i64, links: &[ScannedLink]) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .links
            .entry(audit_id)
            .or_default()
            .extend_from_slice(links);
        Ok(())
    }

    async fn append_results(
        &self,
        _audit_id: Option<i64>,
        results: &[ValidationResult],
    ) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .results
            .extend_from_slice(results);
        Ok(())
    }

    async fn url_history(&self, url: &str, limit: i64) -> Result<Vec<ValidationResult>, AppError> {
        let inner = self.inner.read().await;
        let mut history: Vec<ValidationResult> = inner
            .results
            .iter()
            .rev()
            .filter(|r| r.url == url)
            .cloned()
            .collect();
        // Appended in check order; a stable sort keeps later appends first on equal timestamps.
        history.sort_by(|a, b| b.last_checked.cmp(&a.last_checked));
        history.truncate(clamp_limit(limit));
        Ok(history)
    }

    async fn known_good_urls(&self) -> Result<Vec<String>, AppError> {
        let inner = self.inner.read().await;
        let mut latest: HashMap<&str, &ValidationResult> = HashMap::new();
        for result in &inner.results {
            match latest.get(result.url.as_str()) {
                Some(existing) if existing.last_checked > result.last_checked => {}
                _ => {
                    latest.insert(result.url.as_str(), result);
                }
            }
        }

        let mut urls: Vec<String> = latest
            .into_values()
            .filter(|r| r.status == LinkStatus::Valid)
            .map(|r| r.url.clone())
            .collect();
        urls.sort();
        Ok(urls)
    }
}

#[async_trait]
impl CorrectionRepository for MemoryStore {
    async fn record(&self, correction: AppliedCorrection) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .corrections
            .iter()
            .any(|c| c.rollback_id == correction.rollback_id)
        {
            return Err(AppError::conflict(
                "Correction already recorded",
                json!({"rollback_id": correction.rollback_id}),
            ));
        }
        inner.corrections.push(correction);
        Ok(())
    }

    async fn find(&self, rollback_id: &str) -> Result<Option<AppliedCorrection>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .corrections
            .iter()
            .find(|c| c.rollback_id == rollback_id)
            .cloned())
    }

    async fn mark_rolled_back(
        &self,
        rollback_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner
            .corrections
            .iter_mut()
            .find(|c| c.rollback_id == rollback_id)
        {
            Some(correction) => {
                correction.rolled_back_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, limit: i64) -> Result<Vec<AppliedCorrection>, AppError> {
        let inner = self.inner.read().await;
        let mut corrections = inner.corrections.clone();
        corrections.reverse();
        corrections.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        corrections.truncate(clamp_limit(limit));
        Ok(corrections)
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn save_report(&self, report: &MaintenanceReport) -> Result<i64, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_audit_id += 1;
        let id = inner.next_audit_id;
        let mut stored = report.clone();
        stored.id = Some(id);
        inner.reports.push(stored);
        Ok(id)
    }

    async fn get_report(&self, id: i64) -> Result<Option<MaintenanceReport>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .reports
            .iter()
            .find(|r| r.id == Some(id))
            .cloned())
    }

    async fn latest_report(&self) -> Result<Option<MaintenanceReport>, AppError> {
        Ok(self.inner.read().await.reports.last().cloned())
    }

    async fn list_runs(&self, offset: i64, limit: i64) -> Result<Vec<AuditRunSummary>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reports
            .iter()
            .rev()
            .skip(clamp_limit(offset))
            .take(clamp_limit(limit))
            .filter_map(|r| r.id.map(|id| AuditRunSummary::from_report(id, r)))
            .collect())
    }

    async fn count_runs(&self) -> Result<i64, AppError> {
        Ok(self.inner.read().await.reports.len() as i64)
    }

    async fn mark_alert_sent(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        match inner.reports.iter_mut().find(|r| r.id == Some(id)) {
            Some(report) => {
                report.alert_sent = true;
                Ok(())
            }
            None => Err(AppError::not_found(
                "Audit report not found",
                json!({ "id": id }),
            )),
        }
    }

    async fn record_health(&self, metric: HealthMetric) -> Result<(), AppError> {
        self.inner.write().await.health.push(metric);
        Ok(())
    }

    async fn recent_health(&self, limit: i64) -> Result<Vec<HealthMetric>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .health
            .iter()
            .rev()
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AuditTrigger, CorrectionType, LinkType};
    use chrono::Duration;

    fn result_at(url: &str, status: LinkStatus, at: DateTime<Utc>) -> ValidationResult {
        let mut r = ValidationResult::local(url.to_string(), status, None);
        r.last_checked = at;
        r
    }

    fn correction(id: &str) -> AppliedCorrection {
        AppliedCorrection {
            rollback_id: id.to_string(),
            audit_id: None,
            original_url: "/old".to_string(),
            new_url: "/new".to_string(),
            file_path: "app/page.tsx".to_string(),
            correction_type: CorrectionType::Moved,
            confidence: 0.75,
            applied_at: Utc::now(),
            rolled_back_at: None,
        }
    }

    #[tokio::test]
    async fn test_known_good_uses_latest_verdict() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::minutes(10);
        let t1 = Utc::now();

        store
            .append_results(
                None,
                &[
                    result_at("/a", LinkStatus::Valid, t0),
                    result_at("/a", LinkStatus::Broken, t1),
                    result_at("/b", LinkStatus::Broken, t0),
                    result_at("/b", LinkStatus::Valid, t1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.known_good_urls().await.unwrap(), vec!["/b".to_string()]);
    }

    #[tokio::test]
    async fn test_url_history_newest_first() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::minutes(5);
        let t1 = Utc::now();
        store
            .append_results(
                Some(1),
                &[
                    result_at("/a", LinkStatus::Broken, t0),
                    result_at("/a", LinkStatus::Valid, t1),
                ],
            )
            .await
            .unwrap();

        let history = store.url_history("/a", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, LinkStatus::Valid);

        assert_eq!(store.url_history("/a", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_rollback_id_conflicts() {
        let store = MemoryStore::new();
        store.record(correction("r1")).await.unwrap();
        let err = store.record(correction("r1")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_mark_rolled_back() {
        let store = MemoryStore::new();
        store.record(correction("r1")).await.unwrap();

        assert!(store.mark_rolled_back("r1", Utc::now()).await.unwrap());
        assert!(!store.mark_rolled_back("missing", Utc::now()).await.unwrap());
        assert!(store.find("r1").await.unwrap().unwrap().is_rolled_back());
    }

    #[tokio::test]
    async fn test_reports_get_sequential_ids() {
        let store = MemoryStore::new();
        let mut report = MaintenanceReport::new(AuditTrigger::Manual, true);
        report.finish();

        let first = store.save_report(&report).await.unwrap();
        let second = store.save_report(&report).await.unwrap();
        assert_eq!((first, second), (1, 2));

        assert_eq!(store.count_runs().await.unwrap(), 2);
        assert_eq!(store.latest_report().await.unwrap().unwrap().id, Some(2));

        let runs = store.list_runs(0, 10).await.unwrap();
        assert_eq!(runs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(store.list_runs(1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_links_saved_per_run() {
        let store = MemoryStore::new();
        let link = ScannedLink::new(
            "/about".to_string(),
            "app/page.tsx".to_string(),
            3,
            LinkType::Internal,
            "<a href=\"/about\">".to_string(),
        );
        store.save_links(7, &[link.clone()]).await.unwrap();

        assert_eq!(store.links_for(7).await, vec![link]);
        assert!(store.links_for(8).await.is_empty());
    }
}
