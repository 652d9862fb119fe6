//! Shared error types for the services crate.

use thiserror::Error;

use proctor_core::model::{AnswerError, Level};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::session::SessionPhase;

/// Questions or identity could not be obtained. Recoverable: the user may
/// choose a test type again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("not signed in")]
    Unauthorized,
    #[error("the question bank returned no questions")]
    NoQuestions,
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Answers could not be delivered to the grading collaborator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("submission rejected with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// The platform refused or does not support fullscreen. Never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("fullscreen request denied: {reason}")]
pub struct FullscreenDenied {
    pub reason: String,
}

impl FullscreenDenied {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {operation} while the session is {phase:?}")]
    InvalidTransition {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("{0} is not available for externally hosted content")]
    LegacyMode(&'static str),
    #[error("level {0} is not unlocked for this account")]
    LevelLocked(Level),
    #[error("no undelivered submission to retry")]
    NothingToRetry,
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("PROCTOR_API_URL is not set")]
    MissingApiUrl,
    #[error("invalid URL in PROCTOR_API_URL or PROCTOR_CONTENT_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid PROCTOR_REQUEST_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors raised while assembling [`crate::ExamServices`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
