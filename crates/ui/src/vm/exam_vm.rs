use proctor_core::model::{Level, ScoreTier, TestResult, TestType};
use services::SessionSnapshot;
use services::session::legacy_content_for;

/// One choice on the selection screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestTypeCardVm {
    pub test_type: TestType,
    pub label: &'static str,
    pub description: &'static str,
    pub duration_label: &'static str,
    pub external: bool,
}

#[must_use]
pub fn map_test_type_cards(level: Level) -> Vec<TestTypeCardVm> {
    TestType::ALL
        .iter()
        .map(|&test_type| TestTypeCardVm {
            test_type,
            label: test_type.label(),
            description: test_type.description(),
            duration_label: if test_type.is_half() {
                "45 minutes"
            } else {
                "90 minutes"
            },
            external: legacy_content_for(level, test_type).is_some(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub index: usize,
    pub letter: char,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub index: usize,
    pub number: u32,
    pub text: String,
    pub options: Vec<OptionVm>,
    pub position_label: String,
    pub is_first: bool,
    pub is_last: bool,
}

/// The question under the cursor, or `None` for legacy sessions.
#[must_use]
pub fn map_current_question(snapshot: &SessionSnapshot) -> Option<QuestionVm> {
    let question = snapshot.current_question()?;
    let index = snapshot.cursor;
    let selected = snapshot.answers.get(index).copied().flatten();
    let options = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, text)| OptionVm {
            index: i,
            letter: option_letter(i),
            text: text.clone(),
            selected: selected == Some(i),
        })
        .collect();
    Some(QuestionVm {
        index,
        number: question.number(),
        text: question.text().to_string(),
        options,
        position_label: format!("Question {} of {}", index + 1, snapshot.questions.len()),
        is_first: index == 0,
        is_last: index + 1 >= snapshot.questions.len(),
    })
}

fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

/// Header numbers shown during a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressVm {
    pub remaining_label: String,
    pub answered_label: String,
    pub percent: f64,
    pub low_time: bool,
}

#[must_use]
pub fn map_progress(snapshot: &SessionSnapshot) -> ProgressVm {
    ProgressVm {
        remaining_label: snapshot.remaining_label(),
        answered_label: format!(
            "{}/{} answered",
            snapshot.answered_count(),
            snapshot.questions.len()
        ),
        percent: snapshot.progress() * 100.0,
        low_time: snapshot.remaining_secs > 0 && snapshot.remaining_secs <= 300,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultVm {
    pub score_label: String,
    pub message: &'static str,
    pub tier_class: &'static str,
    pub correct: u32,
    pub wrong: u32,
    pub total: u32,
    pub time_label: String,
    pub participation_only: bool,
}

impl From<&TestResult> for ResultVm {
    fn from(result: &TestResult) -> Self {
        Self {
            score_label: format!("{:.1}%", result.score),
            message: result.band().message(),
            tier_class: match result.tier() {
                ScoreTier::High => "score--high",
                ScoreTier::Medium => "score--medium",
                ScoreTier::Low => "score--low",
            },
            correct: result.correct,
            wrong: result.wrong,
            total: result.total,
            time_label: result.time_spent_label(),
            participation_only: result.total == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::{Question, QuestionId};
    use std::sync::Arc;

    fn snapshot_with(count: u32, cursor: usize) -> SessionSnapshot {
        let level = Level::new(2).unwrap();
        let mut snapshot = SessionSnapshot::idle(level, 3);
        let questions: Vec<Question> = (1..=count)
            .map(|n| {
                Question::new(
                    QuestionId::new(format!("q{n}")),
                    level,
                    n,
                    format!("Q{n}"),
                    vec!["yes".into(), "no".into()],
                )
            })
            .collect();
        snapshot.answers = vec![None; questions.len()];
        snapshot.questions = Arc::from(questions);
        snapshot.cursor = cursor;
        snapshot
    }

    #[test]
    fn level_one_halves_are_marked_external() {
        let cards = map_test_type_cards(Level::new(1).unwrap());
        let external: Vec<bool> = cards.iter().map(|c| c.external).collect();
        assert_eq!(external, vec![true, true, false]);
        assert!(map_test_type_cards(Level::new(2).unwrap()).iter().all(|c| !c.external));
    }

    #[test]
    fn current_question_marks_selection() {
        let mut snapshot = snapshot_with(3, 2);
        snapshot.answers[2] = Some(1);
        let vm = map_current_question(&snapshot).unwrap();
        assert_eq!(vm.position_label, "Question 3 of 3");
        assert!(vm.is_last);
        assert!(!vm.options[0].selected);
        assert!(vm.options[1].selected);
        assert_eq!(vm.options[1].letter, 'B');
    }

    #[test]
    fn progress_labels() {
        let mut snapshot = snapshot_with(4, 1);
        snapshot.answers[0] = Some(0);
        snapshot.remaining_secs = 125;
        let vm = map_progress(&snapshot);
        assert_eq!(vm.remaining_label, "2:05");
        assert_eq!(vm.answered_label, "1/4 answered");
        assert!((vm.percent - 50.0).abs() < f64::EPSILON);
        assert!(vm.low_time);
    }

    #[test]
    fn result_bands() {
        let result = TestResult {
            total: 90,
            correct: 81,
            wrong: 9,
            score: 90.0,
            time_spent: 3725,
        };
        let vm = ResultVm::from(&result);
        assert_eq!(vm.score_label, "90.0%");
        assert_eq!(vm.tier_class, "score--high");
        assert_eq!(vm.time_label, "1h 2m 5s");
        assert!(vm.message.starts_with("Excellent"));
        assert!(!vm.participation_only);
    }
}
