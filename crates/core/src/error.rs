use thiserror::Error;

use crate::model::{ConfigError, QuestionError, SessionSummaryError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
