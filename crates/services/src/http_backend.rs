use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use proctor_core::model::{
    GradedSubmission, Identity, LegacyCompletion, Level, Question, TestResult, TestType,
};

use crate::backend::ExamBackend;
use crate::config::ExamConfig;
use crate::error::{ConfigError, FetchError, SubmissionError};

const DEVICE_ID_HEADER: &str = "x-device-id";

/// `ExamBackend` over the JSON REST API, authenticated by session cookie.
#[derive(Clone)]
pub struct HttpExamBackend {
    client: Client,
    config: ExamConfig,
}

impl HttpExamBackend {
    /// # Errors
    ///
    /// Returns `ConfigError::Client` if the HTTP client cannot be built.
    pub fn new(config: ExamConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        if let Some(device_id) = config.device_id.as_deref() {
            match HeaderValue::from_str(device_id) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(DEVICE_ID_HEADER), value);
                }
                Err(_) => tracing::warn!("device id is not a valid header value; not sent"),
            }
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ExamConfig {
        &self.config
    }
}

#[async_trait]
impl ExamBackend for HttpExamBackend {
    async fn current_identity(&self) -> Result<Identity, FetchError> {
        let response = self
            .client
            .get(self.config.endpoint("auth/me"))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized);
            }
            status if !status.is_success() => return Err(FetchError::HttpStatus(status)),
            _ => {}
        }

        let body: UserEnvelope = response.json().await?;
        Ok(body.user)
    }

    async fn fetch_questions(
        &self,
        level: Level,
        test_type: TestType,
    ) -> Result<Vec<Question>, FetchError> {
        let url = self
            .config
            .endpoint(&format!("tests/questions/{level}/{}", test_type.as_str()));
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(FetchError::Unauthorized),
            status if !status.is_success() => return Err(FetchError::HttpStatus(status)),
            _ => {}
        }

        let body: QuestionsEnvelope = response.json().await?;
        tracing::debug!(%level, %test_type, count = body.questions.len(), "questions fetched");
        Ok(body.questions)
    }

    async fn submit_answers(
        &self,
        submission: &GradedSubmission,
    ) -> Result<TestResult, SubmissionError> {
        let response = self
            .client
            .post(self.config.endpoint("tests/submit"))
            .json(submission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubmissionError::HttpStatus(response.status()));
        }

        let body: GradedResultEnvelope = response.json().await?;
        Ok(body.result)
    }

    async fn complete_legacy(
        &self,
        completion: &LegacyCompletion,
    ) -> Result<TestResult, SubmissionError> {
        let response = self
            .client
            .post(self.config.endpoint("tests/legacy-complete"))
            .json(completion)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubmissionError::HttpStatus(response.status()));
        }

        let body: LegacyResultEnvelope = response.json().await?;
        Ok(body.result)
    }
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Identity,
}

#[derive(Debug, Deserialize)]
struct QuestionsEnvelope {
    questions: Vec<Question>,
}

/// A graded submission must come back with a score; a body without one is a
/// failed delivery.
#[derive(Debug, Deserialize)]
struct GradedResultEnvelope {
    result: TestResult,
}

/// Legacy completions only acknowledge participation.
#[derive(Debug, Deserialize)]
struct LegacyResultEnvelope {
    #[serde(default)]
    result: TestResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_envelope_tolerates_missing_result() {
        let body: LegacyResultEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(body.result, TestResult::default());
    }

    #[test]
    fn graded_envelope_requires_result() {
        let err = serde_json::from_str::<GradedResultEnvelope>(
            r#"{"message":"grading unavailable"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("result"), "{err}");

        let body: GradedResultEnvelope = serde_json::from_str(
            r#"{"result":{"total":2,"correct":1,"wrong":1,"score":50.0,"timeSpent":30}}"#,
        )
        .unwrap();
        assert_eq!(body.result.correct, 1);
        assert_eq!(body.result.time_spent, 30);
    }

    #[test]
    fn questions_envelope_parses_backend_shape() {
        let body: QuestionsEnvelope = serde_json::from_str(
            r#"{"questions":[{"_id":"a","level":1,"number":1,"question":"?","options":["x","y"]}]}"#,
        )
        .unwrap();
        assert_eq!(body.questions.len(), 1);
    }

    #[test]
    fn client_builds_with_device_header() {
        let mut config = ExamConfig::new("http://localhost:5000".parse().unwrap());
        config.device_id = Some("device-1".into());
        let backend = HttpExamBackend::new(config).unwrap();
        assert_eq!(
            backend.config().endpoint("auth/me"),
            "http://localhost:5000/auth/me"
        );
    }
}
