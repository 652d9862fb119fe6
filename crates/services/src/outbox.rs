use std::sync::Arc;

use proctor_core::model::Submission;
use storage::repository::{PendingSubmissionRecord, PendingSubmissionRepository, StorageError};

use crate::backend::ExamBackend;
use crate::error::SubmissionError;

/// Counts from one [`SubmissionOutbox::flush`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Re-sends submissions that earlier runs could not deliver.
#[derive(Clone)]
pub struct SubmissionOutbox {
    backend: Arc<dyn ExamBackend>,
    repo: Arc<dyn PendingSubmissionRepository>,
}

impl SubmissionOutbox {
    #[must_use]
    pub fn new(backend: Arc<dyn ExamBackend>, repo: Arc<dyn PendingSubmissionRepository>) -> Self {
        Self { backend, repo }
    }

    /// Undelivered submissions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the outbox cannot be read.
    pub async fn pending(&self, limit: u32) -> Result<Vec<PendingSubmissionRecord>, StorageError> {
        self.repo.list_pending(limit).await
    }

    /// Try each pending payload once, unchanged. Delivered entries are
    /// removed; failures stay with their attempt count bumped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the outbox cannot be read or updated.
    pub async fn flush(&self, limit: u32) -> Result<FlushReport, StorageError> {
        let mut report = FlushReport::default();
        for record in self.repo.list_pending(limit).await? {
            match self.send(&record.submission).await {
                Ok(()) => {
                    self.repo.remove(record.id).await?;
                    report.delivered += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        id = record.id,
                        attempts = record.attempts,
                        error = %err,
                        "pending submission still undeliverable"
                    );
                    self.repo.record_failure(record.id, &err.to_string()).await?;
                    report.failed += 1;
                }
            }
        }
        if report.delivered + report.failed > 0 {
            tracing::info!(delivered = report.delivered, failed = report.failed, "outbox flushed");
        }
        Ok(report)
    }

    async fn send(&self, submission: &Submission) -> Result<(), SubmissionError> {
        match submission {
            Submission::Graded(payload) => self.backend.submit_answers(payload).await.map(|_| ()),
            Submission::Legacy(payload) => self.backend.complete_legacy(payload).await.map(|_| ()),
        }
    }
}
