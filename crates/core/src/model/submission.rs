use serde::{Deserialize, Serialize};

use crate::model::{AnswerStore, Level, Question, QuestionId, TestType};

/// Payload for grading a normal (question-bank) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubmission {
    pub level: Level,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub question_ids: Vec<QuestionId>,
    pub answers: Vec<i64>,
    pub time_spent: u64,
}

impl GradedSubmission {
    #[must_use]
    pub fn new(
        level: Level,
        test_type: TestType,
        questions: &[Question],
        answers: &AnswerStore,
        time_spent: u64,
    ) -> Self {
        Self {
            level,
            test_type,
            question_ids: questions.iter().map(|q| q.id().clone()).collect(),
            answers: answers.to_wire(),
            time_spent,
        }
    }
}

/// Payload for recording participation in externally hosted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCompletion {
    pub level: Level,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub time_spent: u64,
}

/// A frozen submission, ready to be sent (or re-sent) unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Graded(GradedSubmission),
    Legacy(LegacyCompletion),
}

impl Submission {
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Submission::Graded(s) => s.level,
            Submission::Legacy(s) => s.level,
        }
    }

    #[must_use]
    pub fn test_type(&self) -> TestType {
        match self {
            Submission::Graded(s) => s.test_type,
            Submission::Legacy(s) => s.test_type,
        }
    }

    #[must_use]
    pub fn time_spent(&self) -> u64 {
        match self {
            Submission::Graded(s) => s.time_spent,
            Submission::Legacy(s) => s.time_spent,
        }
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, Submission::Legacy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graded_payload_uses_backend_field_names() {
        let level = Level::new(2).unwrap();
        let questions = vec![
            Question::new(QuestionId::new("a"), level, 1, "?", vec!["x".into(), "y".into()]),
            Question::new(QuestionId::new("b"), level, 2, "?", vec!["x".into(), "y".into()]),
        ];
        let mut answers = AnswerStore::for_questions(&questions);
        answers.set(0, 1).unwrap();

        let payload = GradedSubmission::new(level, TestType::Full, &questions, &answers, 120);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "level": 2,
                "type": "full",
                "questionIds": ["a", "b"],
                "answers": [1, -1],
                "timeSpent": 120
            })
        );
    }

    #[test]
    fn legacy_payload_has_no_answers() {
        let payload = LegacyCompletion {
            level: Level::new(1).unwrap(),
            test_type: TestType::FirstHalf,
            time_spent: 600,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "level": 1, "type": "1-45", "timeSpent": 600 }));
    }
}
