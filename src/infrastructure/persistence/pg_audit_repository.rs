//! PostgreSQL implementation of audit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{AuditRunSummary, AuditTrigger, HealthMetric, MaintenanceReport};
use crate::domain::repositories::AuditRepository;
use crate::error::AppError;

/// PostgreSQL storage for run reports and the health time series.
///
/// Reports are stored whole as JSONB in `audit_history.report`; the scalar
/// columns next to it exist so listings never deserialize full reports.
pub struct PgAuditRepository {
    pool: Arc<PgPool>,
}

impl PgAuditRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ReportRow {
    id: i64,
    report: Json<MaintenanceReport>,
}

impl From<ReportRow> for MaintenanceReport {
    fn from(row: ReportRow) -> Self {
        let mut report = row.report.0;
        report.id = Some(row.id);
        report
    }
}

#[derive(FromRow)]
struct RunRow {
    id: i64,
    trigger: String,
    dry_run: bool,
    started_at: DateTime<Utc>,
    duration_ms: i64,
    health_score: f64,
    broken: i64,
    corrections_applied: i64,
    error_count: i64,
}

impl From<RunRow> for AuditRunSummary {
    fn from(row: RunRow) -> Self {
        Self {
            id: row.id,
            trigger: AuditTrigger::parse(&row.trigger).unwrap_or(AuditTrigger::Manual),
            dry_run: row.dry_run,
            started_at: row.started_at,
            duration_ms: row.duration_ms.max(0) as u64,
            health_score: row.health_score,
            broken: row.broken.max(0) as usize,
            corrections_applied: row.corrections_applied.max(0) as usize,
            error_count: row.error_count.max(0) as usize,
        }
    }
}

#[derive(FromRow)]
struct HealthRow {
    audit_id: Option<i64>,
    recorded_at: DateTime<Utc>,
    total_links: i64,
    broken_links: i64,
    health_score: f64,
    average_response_ms: i64,
}

impl From<HealthRow> for HealthMetric {
    fn from(row: HealthRow) -> Self {
        Self {
            audit_id: row.audit_id,
            recorded_at: row.recorded_at,
            total_links: row.total_links.max(0) as usize,
            broken_links: row.broken_links.max(0) as usize,
            health_score: row.health_score,
            average_response_ms: row.average_response_ms.max(0) as u64,
        }
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn save_report(&self, report: &MaintenanceReport) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO audit_history
                (trigger, dry_run, started_at, finished_at, duration_ms, health_score,
                 broken, corrections_applied, error_count, report)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(report.trigger.as_str())
        .bind(report.dry_run)
        .bind(report.started_at)
        .bind(report.finished_at)
        .bind(i64::try_from(report.duration_ms).unwrap_or(i64::MAX))
        .bind(report.health_score)
        .bind(to_i64(report.summary.broken))
        .bind(to_i64(report.summary.corrections_applied))
        .bind(to_i64(report.errors.len()))
        .bind(Json(report))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(id)
    }

    async fn get_report(&self, id: i64) -> Result<Option<MaintenanceReport>, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(
            "SELECT id, report FROM audit_history WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(MaintenanceReport::from))
    }

    async fn latest_report(&self) -> Result<Option<MaintenanceReport>, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(
            "SELECT id, report FROM audit_history ORDER BY started_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(MaintenanceReport::from))
    }

    async fn list_runs(&self, offset: i64, limit: i64) -> Result<Vec<AuditRunSummary>, AppError> {
        let rows = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, trigger, dry_run, started_at, duration_ms, health_score,
                   broken, corrections_applied, error_count
            FROM audit_history
            ORDER BY started_at DESC, id DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(AuditRunSummary::from).collect())
    }

    async fn count_runs(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_history")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn mark_alert_sent(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE audit_history SET report = jsonb_set(report, '{alert_sent}', 'true') WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Audit report not found",
                serde_json::json!({ "id": id }),
            ));
        }

        Ok(())
    }

    async fn record_health(&self, metric: HealthMetric) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_health_metrics
                (audit_id, recorded_at, total_links, broken_links, health_score, average_response_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(metric.audit_id)
        .bind(metric.recorded_at)
        .bind(to_i64(metric.total_links))
        .bind(to_i64(metric.broken_links))
        .bind(metric.health_score)
        .bind(i64::try_from(metric.average_response_ms).unwrap_or(i64::MAX))
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn recent_health(&self, limit: i64) -> Result<Vec<HealthMetric>, AppError> {
        let rows = sqlx::query_as::<_, HealthRow>(
            r#"
            SELECT audit_id, recorded_at, total_links, broken_links, health_score, average_response_ms
            FROM link_health_metrics
            ORDER BY recorded_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(HealthMetric::from).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
