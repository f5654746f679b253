use quiz_core::model::{AnswerRecord, Question, QuestionId, QuestionSet, SessionSummary};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One question as served by `GET /api/quiz`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionDto {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// Convert the remote list into a `QuestionSet`.
///
/// Questions that fail validation are skipped; the remaining order is kept.
#[must_use]
pub fn question_set_from_dtos(dtos: Vec<QuestionDto>) -> QuestionSet {
    dtos.into_iter()
        .filter_map(|dto| {
            let id = dto.id;
            match Question::new(QuestionId::new(id), dto.question, dto.options, dto.answer) {
                Ok(question) => Some(question),
                Err(err) => {
                    warn!(question_id = id, error = %err, "skipping invalid question");
                    None
                }
            }
        })
        .collect()
}

/// One entry of the submitted answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub question_id: u64,
    pub question_text: String,
    /// `null` when the question timed out.
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl From<&AnswerRecord> for AnswerPayload {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            question_id: record.question_id().value(),
            question_text: record.question_text().to_string(),
            user_answer: record.selected().map(str::to_string),
            correct_answer: record.correct_answer().to_string(),
            is_correct: record.is_correct(),
        }
    }
}

/// Body of `POST /api/quiz/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub score: i64,
    pub total_questions: u32,
    /// Seconds between session start and completion.
    pub time_taken: f64,
    /// Difficulty label, e.g. `Moderate`.
    pub level: String,
    pub answers: Vec<AnswerPayload>,
}

impl SubmissionPayload {
    #[must_use]
    pub fn from_summary(summary: &SessionSummary) -> Self {
        Self {
            score: summary.score(),
            total_questions: summary.total_questions(),
            time_taken: summary.time_taken_secs(),
            level: summary.difficulty().label().to_string(),
            answers: summary.answers().iter().map(AnswerPayload::from).collect(),
        }
    }
}

/// Account details returned by `GET /api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub notifications_enabled: bool,
}
