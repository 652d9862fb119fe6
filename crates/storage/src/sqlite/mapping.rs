use proctor_core::model::Submission;
use sqlx::Row;

use crate::repository::{PendingSubmissionRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn encode_submission(submission: &Submission) -> Result<String, StorageError> {
    serde_json::to_string(submission).map_err(ser)
}

pub(crate) fn map_pending_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PendingSubmissionRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let payload: String = row.try_get("payload").map_err(ser)?;
    let submission: Submission = serde_json::from_str(&payload).map_err(ser)?;
    let created_at = row.try_get("created_at").map_err(ser)?;
    let attempts = u32_from_i64("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?;
    let last_error = row.try_get("last_error").map_err(ser)?;

    Ok(PendingSubmissionRecord {
        id,
        submission,
        created_at,
        attempts,
        last_error,
    })
}
