use serde::{Deserialize, Serialize};

use crate::model::{Level, QuestionId};

/// A multiple-choice question as delivered by the question bank.
///
/// Immutable once fetched; a session owns its questions until it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    id: QuestionId,
    level: Level,
    number: u32,
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        level: Level,
        number: u32,
        text: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            id,
            level,
            number,
            text: text.into(),
            options,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Sequence number within the level (1-based on the wire).
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}
