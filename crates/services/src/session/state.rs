use std::sync::Arc;

use chrono::{DateTime, Utc};

use proctor_core::model::{AnswerStore, Level, Question, Submission, TestResult, TestType};

use super::countdown::format_clock;
use super::legacy::LegacyContent;
use super::monitor::ViolationWarning;
use super::watermark::WatermarkLayout;

/// Lifecycle of one controller. `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Selecting,
    InProgress,
    Submitting,
    Completed,
    Aborted,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Identity could not be established.
    AuthFailed,
    /// The grading collaborator could not be reached; the payload is kept.
    SubmissionFailed,
    /// The user navigated away from a session in progress.
    Abandoned,
}

/// What ended an in-progress session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimeExpired,
    Violations,
}

#[derive(Debug)]
pub(crate) enum Mode {
    Graded {
        questions: Arc<[Question]>,
        answers: AnswerStore,
        cursor: usize,
    },
    Legacy(LegacyContent),
}

/// Data of the attempt from `select_type` onwards.
#[derive(Debug)]
pub(crate) struct ActiveSession {
    pub(crate) level: Level,
    pub(crate) test_type: TestType,
    pub(crate) mode: Mode,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) time_limit_secs: u32,
}

/// A frozen payload and where it is persisted, if anywhere.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) session: ActiveSession,
    pub(crate) submission: Submission,
    pub(crate) outbox_id: Option<i64>,
}

#[derive(Debug)]
pub(crate) enum SessionState {
    NotStarted,
    Selecting,
    InProgress(ActiveSession),
    Submitting(Attempt),
    Completed {
        attempt: Attempt,
        result: TestResult,
    },
    Aborted {
        reason: AbortReason,
        attempt: Option<Attempt>,
    },
}

impl SessionState {
    pub(crate) fn phase(&self) -> SessionPhase {
        match self {
            SessionState::NotStarted => SessionPhase::NotStarted,
            SessionState::Selecting => SessionPhase::Selecting,
            SessionState::InProgress(_) => SessionPhase::InProgress,
            SessionState::Submitting(_) => SessionPhase::Submitting,
            SessionState::Completed { .. } => SessionPhase::Completed,
            SessionState::Aborted { .. } => SessionPhase::Aborted,
        }
    }

    pub(crate) fn session(&self) -> Option<&ActiveSession> {
        match self {
            SessionState::InProgress(session) => Some(session),
            SessionState::Submitting(attempt) | SessionState::Completed { attempt, .. } => {
                Some(&attempt.session)
            }
            SessionState::Aborted {
                attempt: Some(attempt),
                ..
            } => Some(&attempt.session),
            _ => None,
        }
    }
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub level: Level,
    pub test_type: Option<TestType>,
    pub questions: Arc<[Question]>,
    pub answers: Vec<Option<usize>>,
    pub cursor: usize,
    pub remaining_secs: u32,
    pub time_limit_secs: u32,
    pub violations: u32,
    pub violation_limit: u32,
    pub warning: Option<ViolationWarning>,
    pub legacy: Option<LegacyContent>,
    pub result: Option<TestResult>,
    /// Last user-facing failure (fetch, access, submission).
    pub error: Option<String>,
    pub abort_reason: Option<AbortReason>,
    pub can_retry: bool,
    /// Present while the session is in progress or submitting.
    pub watermark: Option<WatermarkLayout>,
}

impl SessionSnapshot {
    /// Empty view for a controller that has not opened yet.
    #[must_use]
    pub fn idle(level: Level, violation_limit: u32) -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            level,
            test_type: None,
            questions: Arc::from(Vec::new()),
            answers: Vec::new(),
            cursor: 0,
            remaining_secs: 0,
            time_limit_secs: 0,
            violations: 0,
            violation_limit,
            warning: None,
            legacy: None,
            result: None,
            error: None,
            abort_reason: None,
            can_retry: false,
            watermark: None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_some()).count()
    }

    /// `(cursor + 1) / count`, or 0 with no questions.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            (self.cursor + 1) as f64 / self.questions.len() as f64
        }
    }

    #[must_use]
    pub fn remaining_label(&self) -> String {
        format_clock(self.remaining_secs)
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.legacy.is_some()
    }
}
