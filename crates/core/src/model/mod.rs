mod answer;
mod config;
mod ids;
mod question;
mod summary;

pub use answer::AnswerRecord;
pub use config::{ConfigError, DEFAULT_DISPLAY_DELAY_MS, Difficulty, SessionConfig, TimeLimit};
pub use ids::{ParseIdError, QuestionId};
pub use question::{Question, QuestionError, QuestionSet};
pub use summary::{SessionSummary, SessionSummaryError};
