use chrono::{DateTime, Utc};
use proctor_core::model::Submission;

use super::SqliteRepository;
use super::mapping::{encode_submission, map_pending_row};
use crate::repository::{PendingSubmissionRecord, PendingSubmissionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl PendingSubmissionRepository for SqliteRepository {
    async fn enqueue(
        &self,
        submission: &Submission,
        created_at: DateTime<Utc>,
        error: &str,
    ) -> Result<i64, StorageError> {
        let kind = if submission.is_legacy() { "legacy" } else { "graded" };
        let payload = encode_submission(submission)?;

        let res = sqlx::query(
            r"
                INSERT INTO pending_submissions (
                    kind, level, test_type, payload, created_at, attempts, last_error
                )
                VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            ",
        )
        .bind(kind)
        .bind(i64::from(submission.level().value()))
        .bind(submission.test_type().as_str())
        .bind(payload)
        .bind(created_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingSubmissionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, payload, created_at, attempts, last_error
                FROM pending_submissions
                ORDER BY created_at ASC, id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_pending_row).collect()
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE pending_submissions
                SET attempts = attempts + 1, last_error = ?2
                WHERE id = ?1
            ",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM pending_submissions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
