//! PostgreSQL implementation of scan repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{LinkStatus, ScannedLink, ValidationResult};
use crate::domain::repositories::ScanRepository;
use crate::error::AppError;

/// Rows per multi-value INSERT; keeps bind parameters well under the protocol limit.
const INSERT_CHUNK: usize = 1000;

/// PostgreSQL repository for scanner output and validation history.
pub struct PgScanRepository {
    pool: Arc<PgPool>,
}

impl PgScanRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ValidationRow {
    url: String,
    status: String,
    status_code: Option<i32>,
    redirect_url: Option<String>,
    error: Option<String>,
    response_time_ms: i64,
    last_checked: DateTime<Utc>,
}

impl TryFrom<ValidationRow> for ValidationResult {
    type Error = AppError;

    fn try_from(row: ValidationRow) -> Result<Self, Self::Error> {
        let status = LinkStatus::parse(&row.status).ok_or_else(|| {
            AppError::internal(
                "Unknown link status in storage",
                json!({"status": row.status, "url": row.url}),
            )
        })?;

        Ok(ValidationResult {
            url: row.url,
            status,
            status_code: row.status_code.and_then(|c| u16::try_from(c).ok()),
            redirect_url: row.redirect_url,
            error: row.error,
            response_time_ms: row.response_time_ms.max(0) as u64,
            last_checked: row.last_checked,
        })
    }
}

#[async_trait]
impl ScanRepository for PgScanRepository {
    async fn save_links(&self, audit_id: i64, links: &[ScannedLink]) -> Result<(), AppError> {
        if links.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chunk in links.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO scanned_links \
                 (audit_id, url, source_file, source_line, link_type, priority, context) ",
            );
            builder.push_values(chunk, |mut row, link| {
                row.push_bind(audit_id)
                    .push_bind(&link.url)
                    .push_bind(&link.source_file)
                    .push_bind(i32::try_from(link.source_line).unwrap_or(i32::MAX))
                    .push_bind(link.link_type.as_str())
                    .push_bind(link.priority.as_str())
                    .push_bind(&link.context);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_results(
        &self,
        audit_id: Option<i64>,
        results: &[ValidationResult],
    ) -> Result<(), AppError> {
        if results.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chunk in results.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO validation_results \
                 (audit_id, url, status, status_code, redirect_url, error, response_time_ms, last_checked) ",
            );
            builder.push_values(chunk, |mut row, result| {
                row.push_bind(audit_id)
                    .push_bind(&result.url)
                    .push_bind(result.status.as_str())
                    .push_bind(result.status_code.map(i32::from))
                    .push_bind(&result.redirect_url)
                    .push_bind(&result.error)
                    .push_bind(i64::try_from(result.response_time_ms).unwrap_or(i64::MAX))
                    .push_bind(result.last_checked);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn url_history(&self, url: &str, limit: i64) -> Result<Vec<ValidationResult>, AppError> {
        let rows = sqlx::query_as::<_, ValidationRow>(
            r#"
            SELECT url, status, status_code, redirect_url, error, response_time_ms, last_checked
            FROM validation_results
            WHERE url = $1
            ORDER BY last_checked DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(url)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(ValidationResult::try_from).collect()
    }

    async fn known_good_urls(&self) -> Result<Vec<String>, AppError> {
        // Latest verdict per URL wins; a URL that used to work but is now broken is excluded.
        let urls = sqlx::query_scalar::<_, String>(
            r#"
            SELECT url FROM (
                SELECT DISTINCT ON (url) url, status
                FROM validation_results
                ORDER BY url, last_checked DESC, id DESC
            ) latest
            WHERE status = 'valid'
            ORDER BY url
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(urls)
    }
}
