//! Scheduled maintenance runs.
//!
//! A single background worker owns the schedule. Start/stop requests are
//! published on a `watch` channel; the worker reacts to the latest value, so
//! a burst of toggles collapses into one state change.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;

use crate::application::services::maintenance::{MaintenanceService, RunOptions};
use crate::domain::entities::AuditTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    enabled: bool,
    interval: Duration,
}

#[derive(Debug, Default)]
struct Progress {
    last_run_id: Option<i64>,
    last_run_at: Option<DateTime<Utc>>,
    last_health_score: Option<f64>,
    next_run_at: Option<DateTime<Utc>>,
}

/// Snapshot of the monitor, as served by the monitoring endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStatus {
    pub enabled: bool,
    pub interval_secs: u64,
    pub worker_alive: bool,
    pub run_in_progress: bool,
    pub last_run_id: Option<i64>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_health_score: Option<f64>,
    pub next_run_at: Option<DateTime<Utc>>,
}

pub struct MonitorService {
    maintenance: Arc<MaintenanceService>,
    schedule: watch::Sender<Schedule>,
    progress: RwLock<Progress>,
    worker_alive: AtomicBool,
}

impl MonitorService {
    pub fn new(maintenance: Arc<MaintenanceService>, enabled: bool, interval: Duration) -> Self {
        let (schedule, _) = watch::channel(Schedule { enabled, interval });
        Self {
            maintenance,
            schedule,
            progress: RwLock::new(Progress::default()),
            worker_alive: AtomicBool::new(false),
        }
    }

    /// Enables scheduled runs, optionally changing the interval.
    pub async fn start(&self, interval: Option<Duration>) -> MonitorStatus {
        self.schedule.send_modify(|s| {
            s.enabled = true;
            if let Some(interval) = interval {
                s.interval = interval;
            }
        });
        tracing::info!(interval_secs = self.schedule.borrow().interval.as_secs(), "Monitoring started");
        self.status().await
    }

    /// Disables scheduled runs. A run already in progress finishes.
    pub async fn stop(&self) -> MonitorStatus {
        self.schedule.send_modify(|s| s.enabled = false);
        self.progress.write().await.next_run_at = None;
        tracing::info!("Monitoring stopped");
        self.status().await
    }

    pub async fn status(&self) -> MonitorStatus {
        let schedule = *self.schedule.borrow();
        let progress = self.progress.read().await;
        MonitorStatus {
            enabled: schedule.enabled,
            interval_secs: schedule.interval.as_secs(),
            worker_alive: self.is_worker_alive(),
            run_in_progress: self.maintenance.is_running(),
            last_run_id: progress.last_run_id,
            last_run_at: progress.last_run_at,
            last_health_score: progress.last_health_score,
            next_run_at: if schedule.enabled {
                progress.next_run_at
            } else {
                None
            },
        }
    }

    pub fn is_worker_alive(&self) -> bool {
        self.worker_alive.load(Ordering::Relaxed)
    }

    /// Spawns the background worker. Call once per process.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move { monitor.run_worker().await })
    }

    async fn run_worker(&self) {
        let mut rx = self.schedule.subscribe();
        self.worker_alive.store(true, Ordering::Relaxed);
        tracing::info!("Monitor worker started");

        loop {
            let schedule = *rx.borrow_and_update();

            if !schedule.enabled {
                if rx.changed().await.is_err() {
                    break;
                }
                continue;
            }

            self.progress.write().await.next_run_at = chrono::Duration::from_std(schedule.interval)
                .ok()
                .and_then(|d| Utc::now().checked_add_signed(d));

            tokio::select! {
                _ = tokio::time::sleep(schedule.interval) => self.run_scheduled().await,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.worker_alive.store(false, Ordering::Relaxed);
        tracing::warn!("Monitor worker stopped");
    }

    async fn run_scheduled(&self) {
        match self
            .maintenance
            .run(RunOptions::new(AuditTrigger::Scheduled))
            .await
        {
            Ok(report) => {
                let mut progress = self.progress.write().await;
                progress.last_run_id = report.id;
                progress.last_run_at = report.finished_at;
                progress.last_health_score = Some(report.health_score);
            }
            Err(e) => tracing::warn!(error = %e, "Scheduled run skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::AppState;

    fn state(root: &std::path::Path) -> AppState {
        let mut config = Config::defaults(root);
        config.validator_batch_delay_ms = 0;
        config.correction_min_budget_secs = 0;
        AppState::in_memory(config).unwrap()
    }

    #[tokio::test]
    async fn test_status_reflects_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = state(dir.path()).monitor;

        let status = monitor.status().await;
        assert!(!status.enabled);
        assert!(!status.worker_alive);
        assert_eq!(status.interval_secs, 86_400);

        let status = monitor.start(Some(Duration::from_secs(120))).await;
        assert!(status.enabled);
        assert_eq!(status.interval_secs, 120);

        let status = monitor.stop().await;
        assert!(!status.enabled);
        assert!(status.next_run_at.is_none());
    }

    #[tokio::test]
    async fn test_worker_runs_on_schedule() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/page.tsx"), "<a href=\"#top\">Top</a>\n").unwrap();
        let monitor = state(dir.path()).monitor;

        let handle = monitor.spawn();
        monitor.start(Some(Duration::from_millis(20))).await;

        let mut last_run = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            last_run = monitor.status().await.last_run_id;
            if last_run.is_some() {
                break;
            }
        }
        assert!(last_run.is_some());
        assert!(monitor.is_worker_alive());

        monitor.stop().await;
        handle.abort();
    }
}
