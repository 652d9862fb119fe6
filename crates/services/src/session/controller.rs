use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use proctor_core::Clock;
use proctor_core::model::{
    AnswerStore, GradedSubmission, Identity, Level, Question, Submission, TestResult, TestType,
};
use storage::repository::PendingSubmissionRepository;

use super::countdown::{Countdown, TickOutcome, TickScheduler, TickTicket};
use super::legacy::{LegacyContent, legacy_content_for};
use super::lockdown::LockdownGuard;
use super::monitor::{FocusLoss, MonitorVerdict, ViolationMonitor, ViolationWarning};
use super::platform::Platform;
use super::state::{
    AbortReason, ActiveSession, Attempt, Mode, SessionPhase, SessionSnapshot, SessionState,
    SubmitTrigger,
};
use super::watermark::WatermarkLayout;
use crate::backend::ExamBackend;
use crate::config::SessionPolicy;
use crate::error::{FetchError, SessionError};

/// Collaborators and settings for one controller.
pub struct SessionDeps {
    pub level: Level,
    pub clock: Clock,
    pub policy: SessionPolicy,
    pub backend: Arc<dyn ExamBackend>,
    pub platform: Box<dyn Platform>,
    pub outbox: Option<Arc<dyn PendingSubmissionRepository>>,
}

impl SessionDeps {
    #[must_use]
    pub fn new(level: Level, backend: Arc<dyn ExamBackend>, platform: Box<dyn Platform>) -> Self {
        Self {
            level,
            clock: Clock::default(),
            policy: SessionPolicy::default(),
            backend,
            platform,
            outbox: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_outbox(mut self, outbox: Arc<dyn PendingSubmissionRepository>) -> Self {
        self.outbox = Some(outbox);
        self
    }
}

/// What the caller must do after a synchronous event handler.
#[derive(Debug)]
#[must_use]
pub enum Step {
    Idle,
    /// The session left `InProgress`; send this payload with
    /// [`SessionController::deliver`].
    Deliver(Submission),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(TestResult),
    /// The session was not in progress (already submitting or finished).
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FocusLossOutcome {
    Ignored,
    Coalesced,
    Warned(ViolationWarning),
    Submitted(SubmitOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    Stale,
    Running { remaining: u32 },
    Expired,
}

/// Owns one proctored attempt from identity check to result.
///
/// Timer, lockdown guard and violation monitor are active exactly while the
/// state is `InProgress`. Every exit from `InProgress` tears all three down
/// before anything is awaited.
pub struct SessionController {
    level: Level,
    clock: Clock,
    policy: SessionPolicy,
    backend: Arc<dyn ExamBackend>,
    platform: Box<dyn Platform>,
    outbox: Option<Arc<dyn PendingSubmissionRepository>>,
    ticks: Box<dyn TickScheduler>,

    state: SessionState,
    identity: Option<Identity>,
    countdown: Countdown,
    monitor: ViolationMonitor,
    guard: LockdownGuard,
    warning: Option<ViolationWarning>,
    last_error: Option<String>,
}

impl SessionController {
    #[must_use]
    pub fn new(deps: SessionDeps, ticks: Box<dyn TickScheduler>) -> Self {
        let SessionDeps {
            level,
            clock,
            policy,
            backend,
            platform,
            outbox,
        } = deps;
        Self {
            level,
            clock,
            countdown: Countdown::new(policy.tick_period),
            monitor: ViolationMonitor::new(policy.violation_allowance, policy.violation_coalesce),
            policy,
            backend,
            platform,
            outbox,
            ticks,
            state: SessionState::NotStarted,
            identity: None,
            guard: LockdownGuard::new(),
            warning: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerStore> {
        match self.state.session().map(|s| &s.mode) {
            Some(Mode::Graded { answers, .. }) => Some(answers),
            _ => None,
        }
    }

    #[must_use]
    pub fn violation_count(&self) -> u32 {
        self.monitor.count()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.state.session().map(|s| s.time_limit_secs)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn lockdown_installed(&self) -> bool {
        self.guard.is_installed()
    }

    #[must_use]
    pub fn countdown_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    #[must_use]
    pub fn monitor_active(&self) -> bool {
        self.monitor.is_active()
    }

    /// The payload kept after a failed delivery, if any.
    #[must_use]
    pub fn retained_submission(&self) -> Option<&Submission> {
        match &self.state {
            SessionState::Aborted {
                attempt: Some(attempt),
                ..
            } => Some(&attempt.submission),
            _ => None,
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// `NotStarted → Selecting` once the test-taker is known.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `NotStarted`; `Fetch` when identity cannot
    /// be established, which aborts the controller.
    pub async fn open(&mut self) -> Result<&Identity, SessionError> {
        self.expect_phase("open", SessionPhase::NotStarted)?;
        match self.backend.current_identity().await {
            Ok(identity) => {
                tracing::info!(user = %identity.id, level = %self.level, "session opened");
                self.state = SessionState::Selecting;
                Ok(self.identity.insert(identity))
            }
            Err(err) => {
                tracing::warn!(error = %err, "identity check failed");
                self.last_error = Some(err.to_string());
                self.state = SessionState::Aborted {
                    reason: AbortReason::AuthFailed,
                    attempt: None,
                };
                Err(err.into())
            }
        }
    }

    /// Start an attempt for `test_type`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Selecting`, `LevelLocked` without access,
    /// `Fetch` when the question bank fails. The controller stays in
    /// `Selecting` on every error and no lockdown is started.
    pub async fn select_type(&mut self, test_type: TestType) -> Result<(), SessionError> {
        self.expect_phase("select a test type", SessionPhase::Selecting)?;
        let allowed = self
            .identity
            .as_ref()
            .is_some_and(|identity| identity.can_access(self.level));
        if !allowed {
            self.last_error = Some(SessionError::LevelLocked(self.level).to_string());
            return Err(SessionError::LevelLocked(self.level));
        }

        if let Err(denied) = self.platform.request_fullscreen() {
            tracing::warn!(reason = %denied.reason, "continuing without fullscreen");
        }

        let (mode, time_limit_secs) = match legacy_content_for(self.level, test_type) {
            Some(content) => {
                tracing::info!(path = content.path, "serving external content");
                (Mode::Legacy(content), self.policy.legacy_limit_secs)
            }
            None => {
                let questions = match fetch_questions(&*self.backend, self.level, test_type)
                    .await
                {
                    Ok(questions) => questions,
                    Err(err) => {
                        tracing::warn!(error = %err, %test_type, "question fetch failed");
                        self.last_error = Some(err.to_string());
                        return Err(err.into());
                    }
                };
                let answers = AnswerStore::for_questions(&questions);
                let limit = if test_type.is_half() {
                    self.policy.half_limit_secs
                } else {
                    self.policy.full_limit_secs
                };
                let mode = Mode::Graded {
                    questions: Arc::from(questions),
                    answers,
                    cursor: 0,
                };
                (mode, limit)
            }
        };

        let session = ActiveSession {
            level: self.level,
            test_type,
            mode,
            started_at: self.clock.now(),
            time_limit_secs,
        };
        self.state = SessionState::InProgress(session);
        self.last_error = None;
        self.warning = None;

        self.guard.install(self.platform.as_mut());
        self.countdown.start(time_limit_secs, self.ticks.as_mut());
        self.monitor.start();
        tracing::info!(level = %self.level, %test_type, time_limit_secs, "session in progress");
        Ok(())
    }

    /// Record or overwrite the selected option for a question.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `InProgress`, `LegacyMode` for external
    /// content, `Answer` for out-of-range indices.
    pub fn answer(&mut self, question: usize, option: usize) -> Result<(), SessionError> {
        let phase = self.phase();
        let SessionState::InProgress(session) = &mut self.state else {
            return Err(SessionError::InvalidTransition {
                operation: "answer",
                phase,
            });
        };
        match &mut session.mode {
            Mode::Graded { answers, .. } => {
                answers.set(question, option)?;
                Ok(())
            }
            Mode::Legacy(_) => Err(SessionError::LegacyMode("answering")),
        }
    }

    /// Move the cursor, clamped to the question range. Returns the new cursor.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `InProgress`, `LegacyMode` for external
    /// content.
    pub fn navigate(&mut self, target: usize) -> Result<usize, SessionError> {
        self.move_cursor(|_, last| target.min(last))
    }

    /// # Errors
    ///
    /// See [`SessionController::navigate`].
    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.move_cursor(|cursor, last| (cursor + 1).min(last))
    }

    /// # Errors
    ///
    /// See [`SessionController::navigate`].
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.move_cursor(|cursor, _| cursor.saturating_sub(1))
    }

    fn move_cursor(
        &mut self,
        to: impl FnOnce(usize, usize) -> usize,
    ) -> Result<usize, SessionError> {
        let phase = self.phase();
        let SessionState::InProgress(session) = &mut self.state else {
            return Err(SessionError::InvalidTransition {
                operation: "navigate",
                phase,
            });
        };
        match &mut session.mode {
            Mode::Graded {
                questions, cursor, ..
            } => {
                let last = questions.len().saturating_sub(1);
                *cursor = to(*cursor, last);
                Ok(*cursor)
            }
            Mode::Legacy(_) => Err(SessionError::LegacyMode("navigation")),
        }
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// `InProgress → Submitting`: tear down, freeze the payload.
    ///
    /// Every trigger after the first finds the session no longer in progress
    /// and is a no-op.
    pub fn begin_submission(&mut self, trigger: SubmitTrigger) -> Step {
        let session = match mem::replace(&mut self.state, SessionState::NotStarted) {
            SessionState::InProgress(session) => session,
            other => {
                tracing::debug!(?trigger, phase = ?other.phase(), "submit ignored");
                self.state = other;
                return Step::Idle;
            }
        };
        self.teardown();
        let elapsed = self.clock.elapsed_secs_since(session.started_at);
        let submission = match &session.mode {
            Mode::Graded {
                questions, answers, ..
            } => Submission::Graded(GradedSubmission::new(
                session.level,
                session.test_type,
                questions,
                answers,
                elapsed,
            )),
            Mode::Legacy(_) => Submission::Legacy(LegacyContent::completion(
                session.level,
                session.test_type,
                elapsed,
            )),
        };
        tracing::info!(
            ?trigger,
            elapsed,
            legacy = submission.is_legacy(),
            "submitting session"
        );
        self.state = SessionState::Submitting(Attempt {
            session,
            submission: submission.clone(),
            outbox_id: None,
        });
        Step::Deliver(submission)
    }

    /// Send a frozen payload. Success completes the session; failure aborts
    /// it, keeping the payload in memory and in the outbox for a retry.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Submitting`; `Submission` when delivery
    /// fails.
    pub async fn deliver(&mut self, submission: Submission) -> Result<TestResult, SessionError> {
        self.expect_phase("deliver", SessionPhase::Submitting)?;
        let outcome = match &submission {
            Submission::Graded(payload) => self.backend.submit_answers(payload).await,
            Submission::Legacy(payload) => self.backend.complete_legacy(payload).await,
        };

        let mut attempt = match mem::replace(&mut self.state, SessionState::NotStarted) {
            SessionState::Submitting(attempt) => attempt,
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(SessionError::InvalidTransition {
                    operation: "deliver",
                    phase,
                });
            }
        };

        match outcome {
            Ok(result) => {
                if let Some(id) = attempt.outbox_id.take() {
                    forget_pending(self.outbox.as_deref(), id).await;
                }
                tracing::info!(
                    score = result.score,
                    time_spent = result.time_spent,
                    "session completed"
                );
                self.last_error = None;
                self.state = SessionState::Completed {
                    attempt,
                    result: result.clone(),
                };
                Ok(result)
            }
            Err(err) => {
                tracing::error!(error = %err, "submission failed; answers retained");
                self.last_error = Some(err.to_string());
                attempt.outbox_id = persist_pending(
                    self.outbox.as_deref(),
                    &attempt.submission,
                    attempt.outbox_id,
                    self.clock.now(),
                    &err.to_string(),
                )
                .await;
                self.state = SessionState::Aborted {
                    reason: AbortReason::SubmissionFailed,
                    attempt: Some(attempt),
                };
                Err(err.into())
            }
        }
    }

    /// Begin and deliver in one call.
    ///
    /// # Errors
    ///
    /// See [`SessionController::deliver`].
    pub async fn submit(&mut self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        match self.begin_submission(trigger) {
            Step::Idle => Ok(SubmitOutcome::Ignored),
            Step::Deliver(submission) => {
                let result = self.deliver(submission).await?;
                Ok(SubmitOutcome::Completed(result))
            }
        }
    }

    /// `Aborted → Submitting` with the identical retained payload.
    ///
    /// # Errors
    ///
    /// `NothingToRetry` unless aborted by a failed submission.
    pub fn begin_retry(&mut self) -> Result<Submission, SessionError> {
        let attempt = match mem::replace(&mut self.state, SessionState::NotStarted) {
            SessionState::Aborted {
                attempt: Some(attempt),
                ..
            } => attempt,
            other => {
                self.state = other;
                return Err(SessionError::NothingToRetry);
            }
        };
        tracing::info!(outbox_id = ?attempt.outbox_id, "retrying submission");
        let submission = attempt.submission.clone();
        self.state = SessionState::Submitting(attempt);
        Ok(submission)
    }

    /// # Errors
    ///
    /// See [`SessionController::begin_retry`] and
    /// [`SessionController::deliver`].
    pub async fn retry_submission(&mut self) -> Result<TestResult, SessionError> {
        let submission = self.begin_retry()?;
        self.deliver(submission).await
    }

    //
    // ─── TIMER & VIOLATIONS ────────────────────────────────────────────────────
    //

    /// Handle a delivered countdown tick.
    pub fn tick(&mut self, ticket: TickTicket) -> (TickEffect, Step) {
        if !matches!(self.state, SessionState::InProgress(_)) {
            return (TickEffect::Stale, Step::Idle);
        }
        match self.countdown.on_tick(ticket, self.ticks.as_mut()) {
            TickOutcome::Stale => (TickEffect::Stale, Step::Idle),
            TickOutcome::Running { remaining } => (TickEffect::Running { remaining }, Step::Idle),
            TickOutcome::Expired => {
                tracing::info!("time limit reached");
                (
                    TickEffect::Expired,
                    self.begin_submission(SubmitTrigger::TimeExpired),
                )
            }
        }
    }

    /// # Errors
    ///
    /// Delivery errors when the tick expired the session.
    pub async fn on_tick(&mut self, ticket: TickTicket) -> Result<TickEffect, SessionError> {
        let (effect, step) = self.tick(ticket);
        if let Step::Deliver(submission) = step {
            self.deliver(submission).await?;
        }
        Ok(effect)
    }

    /// Count a focus loss. The forcing violation begins submission.
    pub fn focus_lost(&mut self, kind: FocusLoss) -> (MonitorVerdict, Step) {
        if !matches!(self.state, SessionState::InProgress(_)) {
            return (MonitorVerdict::Ignored, Step::Idle);
        }
        let verdict = self.monitor.record(kind, self.clock.now());
        let step = match verdict {
            MonitorVerdict::Warn(warning) => {
                self.warning = Some(warning);
                Step::Idle
            }
            MonitorVerdict::ForceSubmit { count } => {
                tracing::warn!(count, "violation allowance exhausted");
                self.begin_submission(SubmitTrigger::Violations)
            }
            MonitorVerdict::Ignored | MonitorVerdict::Coalesced => Step::Idle,
        };
        (verdict, step)
    }

    /// # Errors
    ///
    /// Delivery errors when the violation forced submission.
    pub async fn on_focus_loss(
        &mut self,
        kind: FocusLoss,
    ) -> Result<FocusLossOutcome, SessionError> {
        let (verdict, step) = self.focus_lost(kind);
        let outcome = match (verdict, step) {
            (_, Step::Deliver(submission)) => {
                let result = self.deliver(submission).await?;
                FocusLossOutcome::Submitted(SubmitOutcome::Completed(result))
            }
            (MonitorVerdict::Warn(warning), Step::Idle) => FocusLossOutcome::Warned(warning),
            (MonitorVerdict::Coalesced, Step::Idle) => FocusLossOutcome::Coalesced,
            (MonitorVerdict::ForceSubmit { .. }, Step::Idle) => {
                FocusLossOutcome::Submitted(SubmitOutcome::Ignored)
            }
            (MonitorVerdict::Ignored, Step::Idle) => FocusLossOutcome::Ignored,
        };
        Ok(outcome)
    }

    pub fn focus_regained(&mut self) {
        if matches!(self.state, SessionState::InProgress(_)) {
            self.monitor.regained();
        }
    }

    //
    // ─── EXIT PATHS ────────────────────────────────────────────────────────────
    //

    /// Navigation away or unmount. An attempt in progress is abandoned
    /// without a submission.
    pub fn leave(&mut self) {
        self.teardown();
        if matches!(self.state, SessionState::InProgress(_)) {
            tracing::warn!("session abandoned");
            self.state = SessionState::Aborted {
                reason: AbortReason::Abandoned,
                attempt: None,
            };
        }
    }

    /// Back to type selection after a terminal state.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is completed or aborted.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let phase = self.phase();
        if !phase.is_terminal() {
            return Err(SessionError::InvalidTransition {
                operation: "reset",
                phase,
            });
        }
        self.teardown();
        self.warning = None;
        self.last_error = None;
        self.state = if self.identity.is_some() {
            SessionState::Selecting
        } else {
            SessionState::NotStarted
        };
        Ok(())
    }

    /// Cancel the tick, stop counting, remove the guard. Idempotent.
    fn teardown(&mut self) {
        self.countdown.cancel(self.ticks.as_mut());
        self.monitor.stop();
        self.guard.dispose(self.platform.as_mut());
    }

    fn expect_phase(
        &self,
        operation: &'static str,
        expected: SessionPhase,
    ) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { operation, phase })
        }
    }

    //
    // ─── VIEW ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::idle(self.level, self.monitor.limit());
        snapshot.phase = self.phase();
        snapshot.violations = self.monitor.count();
        snapshot.warning = self.warning;
        snapshot.error = self.last_error.clone();
        snapshot.remaining_secs = self.countdown.remaining();

        if let Some(session) = self.state.session() {
            snapshot.test_type = Some(session.test_type);
            snapshot.time_limit_secs = session.time_limit_secs;
            match &session.mode {
                Mode::Graded {
                    questions,
                    answers,
                    cursor,
                } => {
                    snapshot.questions = Arc::clone(questions);
                    snapshot.answers = answers.slots().to_vec();
                    snapshot.cursor = *cursor;
                }
                Mode::Legacy(content) => snapshot.legacy = Some(*content),
            }
        }

        match &self.state {
            SessionState::InProgress(_) | SessionState::Submitting(_) => {
                snapshot.watermark = self.identity.as_ref().map(WatermarkLayout::for_identity);
            }
            SessionState::Completed { result, .. } => snapshot.result = Some(result.clone()),
            SessionState::Aborted { reason, attempt } => {
                snapshot.abort_reason = Some(*reason);
                snapshot.can_retry = attempt.is_some();
            }
            SessionState::NotStarted | SessionState::Selecting => {}
        }
        snapshot
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("level", &self.level)
            .field("phase", &self.phase())
            .field("violations", &self.monitor.count())
            .field("remaining_secs", &self.countdown.remaining())
            .finish_non_exhaustive()
    }
}

async fn fetch_questions(
    backend: &dyn ExamBackend,
    level: Level,
    test_type: TestType,
) -> Result<Vec<Question>, FetchError> {
    let questions = backend.fetch_questions(level, test_type).await?;
    if questions.is_empty() {
        return Err(FetchError::NoQuestions);
    }
    Ok(questions)
}

/// Store or update the outbox entry for an undelivered payload.
async fn persist_pending(
    outbox: Option<&dyn PendingSubmissionRepository>,
    submission: &Submission,
    existing: Option<i64>,
    now: DateTime<Utc>,
    error: &str,
) -> Option<i64> {
    let outbox = outbox?;
    match existing {
        Some(id) => {
            if let Err(err) = outbox.record_failure(id, error).await {
                tracing::warn!(error = %err, id, "could not update pending submission");
            }
            Some(id)
        }
        None => match outbox.enqueue(submission, now, error).await {
            Ok(id) => {
                tracing::info!(id, "submission stored for later delivery");
                Some(id)
            }
            Err(err) => {
                tracing::error!(error = %err, "could not store pending submission");
                None
            }
        },
    }
}

async fn forget_pending(outbox: Option<&dyn PendingSubmissionRepository>, id: i64) {
    if let Some(outbox) = outbox {
        if let Err(err) = outbox.remove(id).await {
            tracing::warn!(error = %err, id, "could not clear delivered submission");
        }
    }
}
