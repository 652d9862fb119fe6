use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proctor_core::model::Submission;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A submission that could not be delivered, kept so it can be re-sent
/// byte-for-byte later.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmissionRecord {
    pub id: i64,
    pub submission: Submission,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Outbox contract for undelivered submissions.
#[async_trait]
pub trait PendingSubmissionRepository: Send + Sync {
    /// Store a submission that failed to send. Counts as the first attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn enqueue(
        &self,
        submission: &Submission,
        created_at: DateTime<Utc>,
        error: &str,
    ) -> Result<i64, StorageError>;

    /// Oldest-first list of undelivered submissions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingSubmissionRecord>, StorageError>;

    /// Bump the attempt counter after another failed delivery.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn record_failure(&self, id: i64, error: &str) -> Result<(), StorageError>;

    /// Drop a record once it has been delivered.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn remove(&self, id: i64) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    pending: Arc<Mutex<BTreeMap<i64, PendingSubmissionRecord>>>,
    next_id: Arc<Mutex<i64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingSubmissionRepository for InMemoryRepository {
    async fn enqueue(
        &self,
        submission: &Submission,
        created_at: DateTime<Utc>,
        error: &str,
    ) -> Result<i64, StorageError> {
        let id = {
            let mut next = self
                .next_id
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            *next += 1;
            *next
        };
        let mut guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            id,
            PendingSubmissionRecord {
                id,
                submission: submission.clone(),
                created_at,
                attempts: 1,
                last_error: Some(error.to_string()),
            },
        );
        Ok(id)
    }

    async fn list_pending(&self, limit: u32) -> Result<Vec<PendingSubmissionRecord>, StorageError> {
        let guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.values().take(limit).cloned().collect())
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        record.attempts = record.attempts.saturating_add(1);
        record.last_error = Some(error.to_string());
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), StorageError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub pending_submissions: Arc<dyn PendingSubmissionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            pending_submissions: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::{Level, LegacyCompletion, TestType};
    use proctor_core::time::fixed_now;

    fn legacy(time_spent: u64) -> Submission {
        Submission::Legacy(LegacyCompletion {
            level: Level::new(1).unwrap(),
            test_type: TestType::FirstHalf,
            time_spent,
        })
    }

    #[tokio::test]
    async fn enqueue_list_remove() {
        let repo = InMemoryRepository::new();
        let first = repo.enqueue(&legacy(10), fixed_now(), "timeout").await.unwrap();
        let second = repo.enqueue(&legacy(20), fixed_now(), "timeout").await.unwrap();

        let pending = repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first);
        assert_eq!(pending[0].submission, legacy(10));
        assert_eq!(pending[0].attempts, 1);

        repo.remove(first).await.unwrap();
        let pending = repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);
    }

    #[tokio::test]
    async fn record_failure_bumps_attempts() {
        let repo = InMemoryRepository::new();
        let id = repo.enqueue(&legacy(10), fixed_now(), "timeout").await.unwrap();
        repo.record_failure(id, "503").await.unwrap();

        let pending = repo.list_pending(1).await.unwrap();
        assert_eq!(pending[0].attempts, 2);
        assert_eq!(pending[0].last_error.as_deref(), Some("503"));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.remove(9).await, Err(StorageError::NotFound)));
        assert!(matches!(
            repo.record_failure(9, "x").await,
            Err(StorageError::NotFound)
        ));
    }
}
