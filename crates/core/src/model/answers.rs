use thiserror::Error;

use crate::model::Question;

/// Wire encoding of an empty answer slot.
pub const NO_SELECTION: i64 = -1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question index {index} is out of range for {len} questions")]
    QuestionOutOfRange { index: usize, len: usize },
    #[error("option {option} is out of range for question {question} ({options} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        options: usize,
    },
}

/// Fixed-length mapping from question index to selected option index.
///
/// The length is set once from the question list and never changes; every slot
/// starts as "no selection".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerStore {
    slots: Vec<Option<usize>>,
    option_counts: Vec<usize>,
}

impl AnswerStore {
    #[must_use]
    pub fn for_questions(questions: &[Question]) -> Self {
        Self {
            slots: vec![None; questions.len()],
            option_counts: questions.iter().map(Question::option_count).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, question: usize) -> Option<usize> {
        self.slots.get(question).copied().flatten()
    }

    #[must_use]
    pub fn is_answered(&self, question: usize) -> bool {
        self.get(question).is_some()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Overwrite the selection for `question`. Re-answering is always allowed.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError` if either index is out of range.
    pub fn set(&mut self, question: usize, option: usize) -> Result<(), AnswerError> {
        let len = self.slots.len();
        let options = *self
            .option_counts
            .get(question)
            .ok_or(AnswerError::QuestionOutOfRange { index: question, len })?;
        if option >= options {
            return Err(AnswerError::OptionOutOfRange {
                question,
                option,
                options,
            });
        }
        self.slots[question] = Some(option);
        Ok(())
    }

    /// Answers in submission order, unanswered slots as `NO_SELECTION`.
    #[must_use]
    pub fn to_wire(&self) -> Vec<i64> {
        self.slots
            .iter()
            .map(|slot| slot.and_then(|o| i64::try_from(o).ok()).unwrap_or(NO_SELECTION))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, QuestionId};

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    Level::new(1).unwrap(),
                    u32::try_from(i + 1).unwrap(),
                    "?",
                    vec!["a".into(), "b".into(), "c".into()],
                )
            })
            .collect()
    }

    #[test]
    fn starts_with_every_slot_empty() {
        let store = AnswerStore::for_questions(&questions(45));
        assert_eq!(store.len(), 45);
        assert!(store.slots().iter().all(Option::is_none));
        assert_eq!(store.to_wire(), vec![NO_SELECTION; 45]);
    }

    #[test]
    fn reanswer_overwrites() {
        let mut store = AnswerStore::for_questions(&questions(2));
        store.set(1, 0).unwrap();
        store.set(1, 2).unwrap();
        assert_eq!(store.get(1), Some(2));
        assert_eq!(store.answered_count(), 1);
        assert_eq!(store.to_wire(), vec![NO_SELECTION, 2]);
    }

    #[test]
    fn out_of_range_is_rejected_without_mutation() {
        let mut store = AnswerStore::for_questions(&questions(2));
        assert_eq!(
            store.set(2, 0),
            Err(AnswerError::QuestionOutOfRange { index: 2, len: 2 })
        );
        assert!(matches!(
            store.set(0, 3),
            Err(AnswerError::OptionOutOfRange { options: 3, .. })
        ));
        assert_eq!(store.answered_count(), 0);
    }
}
