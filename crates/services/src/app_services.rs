use std::sync::Arc;

use proctor_core::model::Level;
use storage::repository::Storage;

use crate::Clock;
use crate::backend::ExamBackend;
use crate::config::{ExamConfig, SessionPolicy};
use crate::error::ExamServicesError;
use crate::http_backend::HttpExamBackend;
use crate::outbox::SubmissionOutbox;
use crate::session::{Platform, SessionDeps};

/// Assembles the backend client, outbox storage and session settings the
/// views need.
#[derive(Clone)]
pub struct ExamServices {
    clock: Clock,
    policy: SessionPolicy,
    backend: Arc<dyn ExamBackend>,
    storage: Storage,
    outbox: Arc<SubmissionOutbox>,
}

impl ExamServices {
    /// HTTP backend from `config`, outbox in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `ExamServicesError` if the client cannot be built or storage
    /// initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: ExamConfig,
        clock: Clock,
    ) -> Result<Self, ExamServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let backend: Arc<dyn ExamBackend> = Arc::new(HttpExamBackend::new(config)?);
        Ok(Self::with_backend(backend, storage, clock))
    }

    #[must_use]
    pub fn with_backend(backend: Arc<dyn ExamBackend>, storage: Storage, clock: Clock) -> Self {
        let outbox = Arc::new(SubmissionOutbox::new(
            Arc::clone(&backend),
            Arc::clone(&storage.pending_submissions),
        ));
        Self {
            clock,
            policy: SessionPolicy::default(),
            backend,
            storage,
            outbox,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Dependencies for a fresh controller at `level`.
    #[must_use]
    pub fn session_deps(&self, level: Level, platform: Box<dyn Platform>) -> SessionDeps {
        SessionDeps::new(level, Arc::clone(&self.backend), platform)
            .with_clock(self.clock.clone())
            .with_policy(self.policy)
            .with_outbox(Arc::clone(&self.storage.pending_submissions))
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn ExamBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn outbox(&self) -> Arc<SubmissionOutbox> {
        Arc::clone(&self.outbox)
    }

    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }
}
