use thiserror::Error;

use crate::model::{AnswerError, LevelError, TestTypeError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    TestType(#[from] TestTypeError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}
