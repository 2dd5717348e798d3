//! PostgreSQL implementation of correction repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{AppliedCorrection, CorrectionType};
use crate::domain::repositories::CorrectionRepository;
use crate::error::AppError;

/// PostgreSQL ledger of applied corrections.
///
/// The rollback id is the primary key, so recording the same backup twice
/// surfaces as [`AppError::Conflict`].
pub struct PgCorrectionRepository {
    pool: Arc<PgPool>,
}

impl PgCorrectionRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CorrectionRow {
    rollback_id: String,
    audit_id: Option<i64>,
    original_url: String,
    new_url: String,
    file_path: String,
    correction_type: String,
    confidence: f64,
    applied_at: DateTime<Utc>,
    rolled_back_at: Option<DateTime<Utc>>,
}

impl TryFrom<CorrectionRow> for AppliedCorrection {
    type Error = AppError;

    fn try_from(row: CorrectionRow) -> Result<Self, Self::Error> {
        let correction_type = CorrectionType::parse(&row.correction_type).ok_or_else(|| {
            AppError::internal(
                "Unknown correction type in storage",
                json!({"correction_type": row.correction_type, "rollback_id": row.rollback_id}),
            )
        })?;

        Ok(AppliedCorrection {
            rollback_id: row.rollback_id,
            audit_id: row.audit_id,
            original_url: row.original_url,
            new_url: row.new_url,
            file_path: row.file_path,
            correction_type,
            confidence: row.confidence,
            applied_at: row.applied_at,
            rolled_back_at: row.rolled_back_at,
        })
    }
}

const SELECT_COLUMNS: &str = "rollback_id, audit_id, original_url, new_url, file_path, \
     correction_type, confidence, applied_at, rolled_back_at";

#[async_trait]
impl CorrectionRepository for PgCorrectionRepository {
    async fn record(&self, correction: AppliedCorrection) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO applied_corrections
                (rollback_id, audit_id, original_url, new_url, file_path,
                 correction_type, confidence, applied_at, rolled_back_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&correction.rollback_id)
        .bind(correction.audit_id)
        .bind(&correction.original_url)
        .bind(&correction.new_url)
        .bind(&correction.file_path)
        .bind(correction.correction_type.as_str())
        .bind(correction.confidence)
        .bind(correction.applied_at)
        .bind(correction.rolled_back_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find(&self, rollback_id: &str) -> Result<Option<AppliedCorrection>, AppError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM applied_corrections WHERE rollback_id = $1");
        let row = sqlx::query_as::<_, CorrectionRow>(&sql)
            .bind(rollback_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(AppliedCorrection::try_from).transpose()
    }

    async fn mark_rolled_back(
        &self,
        rollback_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE applied_corrections SET rolled_back_at = $2
            WHERE rollback_id = $1
            "#,
        )
        .bind(rollback_id)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: i64) -> Result<Vec<AppliedCorrection>, AppError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM applied_corrections ORDER BY applied_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, CorrectionRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(AppliedCorrection::try_from).collect()
    }
}
