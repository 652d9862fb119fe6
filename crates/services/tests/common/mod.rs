#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use proctor_core::model::{
    GradedSubmission, Identity, LegacyCompletion, Level, LevelAccess, Question, QuestionId,
    TestResult, TestType, UserId,
};
use proctor_core::time::fixed_now;
use services::session::{InMemoryEventHost, ManualTicks, SessionController, SessionDeps};
use services::{Clock, ExamBackend, FetchError, SubmissionError};
use storage::repository::InMemoryRepository;

pub fn level(n: u8) -> Level {
    Level::new(n).unwrap()
}

pub fn identity() -> Identity {
    Identity {
        id: UserId::new("u-1"),
        username: "jdoe".into(),
        role: "user".into(),
        level_access: LevelAccess {
            level1: true,
            level2: true,
            level3: true,
        },
        passport_full_name: Some("Jane Doe".into()),
        passport_number: Some("AB123".into()),
    }
}

pub fn questions(level: Level, count: u32) -> Vec<Question> {
    (1..=count)
        .map(|n| {
            Question::new(
                QuestionId::new(format!("q{n}")),
                level,
                n,
                format!("Question {n}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
            )
        })
        .collect()
}

#[derive(Default)]
struct FakeState {
    identity: Option<Identity>,
    question_count: u32,
    fail_fetch: bool,
    failing_submissions: u32,
    fetches: Vec<(Level, TestType)>,
    graded: Vec<GradedSubmission>,
    legacy: Vec<LegacyCompletion>,
}

/// Backend double that records every call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(question_count: u32) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.identity = Some(identity());
            state.question_count = question_count;
        }
        backend
    }

    pub fn with_identity(self, identity: Option<Identity>) -> Self {
        self.state.lock().unwrap().identity = identity;
        self
    }

    pub fn failing_fetch(self) -> Self {
        self.state.lock().unwrap().fail_fetch = true;
        self
    }

    /// The next `n` submissions fail.
    pub fn failing_submissions(self, n: u32) -> Self {
        self.set_failing_submissions(n);
        self
    }

    pub fn set_failing_submissions(&self, n: u32) {
        self.state.lock().unwrap().failing_submissions = n;
    }

    pub fn fetches(&self) -> Vec<(Level, TestType)> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn graded(&self) -> Vec<GradedSubmission> {
        self.state.lock().unwrap().graded.clone()
    }

    pub fn legacy(&self) -> Vec<LegacyCompletion> {
        self.state.lock().unwrap().legacy.clone()
    }

    pub fn submission_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.graded.len() + state.legacy.len()
    }

    fn take_failure(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl ExamBackend for FakeBackend {
    async fn current_identity(&self) -> Result<Identity, FetchError> {
        self.state
            .lock()
            .unwrap()
            .identity
            .clone()
            .ok_or(FetchError::Unauthorized)
    }

    async fn fetch_questions(
        &self,
        level: Level,
        test_type: TestType,
    ) -> Result<Vec<Question>, FetchError> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push((level, test_type));
        if state.fail_fetch {
            return Err(FetchError::Unavailable("question bank down".into()));
        }
        Ok(questions(level, state.question_count))
    }

    async fn submit_answers(
        &self,
        submission: &GradedSubmission,
    ) -> Result<TestResult, SubmissionError> {
        let fail = self.take_failure();
        self.state.lock().unwrap().graded.push(submission.clone());
        if fail {
            return Err(SubmissionError::Unavailable("grading offline".into()));
        }
        let total = submission.answers.len() as u32;
        let correct = submission.answers.iter().filter(|a| **a == 0).count() as u32;
        Ok(TestResult {
            total,
            correct,
            wrong: total - correct,
            score: if total == 0 {
                0.0
            } else {
                f64::from(correct) * 100.0 / f64::from(total)
            },
            time_spent: submission.time_spent,
        })
    }

    async fn complete_legacy(
        &self,
        completion: &LegacyCompletion,
    ) -> Result<TestResult, SubmissionError> {
        let fail = self.take_failure();
        self.state.lock().unwrap().legacy.push(completion.clone());
        if fail {
            return Err(SubmissionError::Unavailable("grading offline".into()));
        }
        Ok(TestResult {
            time_spent: completion.time_spent,
            ..TestResult::default()
        })
    }
}

/// Controller wired to fakes, with probes kept by the test.
pub struct Harness {
    pub controller: SessionController,
    pub backend: Arc<FakeBackend>,
    pub host: InMemoryEventHost,
    pub ticks: ManualTicks,
    pub clock: Clock,
    pub outbox: InMemoryRepository,
}

impl Harness {
    pub fn new(level_value: u8, backend: FakeBackend) -> Self {
        Self::with_host(level_value, backend, InMemoryEventHost::new())
    }

    pub fn with_host(level_value: u8, backend: FakeBackend, host: InMemoryEventHost) -> Self {
        let backend = Arc::new(backend);
        let ticks = ManualTicks::new();
        let clock = Clock::fixed(fixed_now());
        let outbox = InMemoryRepository::new();
        let deps = SessionDeps::new(level(level_value), backend.clone(), Box::new(host.clone()))
            .with_clock(clock.clone())
            .with_outbox(Arc::new(outbox.clone()));
        let controller = SessionController::new(deps, Box::new(ticks.clone()));
        Self {
            controller,
            backend,
            host,
            ticks,
            clock,
            outbox,
        }
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }

    /// Lockdown, countdown and monitor agree with each other.
    pub fn integrity_active(&self) -> bool {
        let guard = self.controller.lockdown_installed();
        assert_eq!(guard, self.controller.countdown_armed());
        assert_eq!(guard, self.controller.monitor_active());
        assert_eq!(guard, self.host.attached_count() == 1);
        guard
    }
}
