#![forbid(unsafe_code)]

pub mod app_services;
pub mod backend;
pub mod config;
pub mod error;
pub mod http_backend;
pub mod outbox;
pub mod session;

pub use proctor_core::Clock;

pub use app_services::ExamServices;
pub use backend::ExamBackend;
pub use config::{ExamConfig, SessionPolicy};
pub use error::{
    ConfigError, ExamServicesError, FetchError, FullscreenDenied, SessionError, SubmissionError,
};
pub use http_backend::HttpExamBackend;
pub use outbox::{FlushReport, SubmissionOutbox};
pub use session::{
    SessionController, SessionDeps, SessionEvent, SessionHandle, SessionPhase, SessionRunner,
    SessionSnapshot,
};
