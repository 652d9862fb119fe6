use async_trait::async_trait;

use proctor_core::model::{
    GradedSubmission, Identity, LegacyCompletion, Level, Question, TestResult, TestType,
};

use crate::error::{FetchError, SubmissionError};

/// The external collaborators the session engine consumes: identity, question
/// bank and grading.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// The signed-in test-taker.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unauthorized` when no session cookie is valid.
    async fn current_identity(&self) -> Result<Identity, FetchError>;

    /// Ordered questions for a level and range.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the question bank cannot be reached.
    async fn fetch_questions(
        &self,
        level: Level,
        test_type: TestType,
    ) -> Result<Vec<Question>, FetchError>;

    /// Grade a question-bank session.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the answers could not be delivered.
    async fn submit_answers(
        &self,
        submission: &GradedSubmission,
    ) -> Result<TestResult, SubmissionError>;

    /// Record participation in externally hosted content.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the completion could not be delivered.
    async fn complete_legacy(
        &self,
        completion: &LegacyCompletion,
    ) -> Result<TestResult, SubmissionError>;
}
