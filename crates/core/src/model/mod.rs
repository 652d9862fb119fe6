mod answers;
mod identity;
mod ids;
mod level;
mod question;
mod result;
mod submission;
mod test_type;

pub use answers::{AnswerError, AnswerStore, NO_SELECTION};
pub use identity::{Identity, LevelAccess, MISSING_DOCUMENT};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use level::{Level, LevelError};
pub use question::Question;
pub use result::{ScoreBand, ScoreTier, TestResult, format_duration_label};
pub use submission::{GradedSubmission, LegacyCompletion, Submission};
pub use test_type::{TestType, TestTypeError};
