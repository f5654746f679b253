use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId};
use crate::scoring::{AnswerOutcome, ScoringPolicy};

/// Immutable record of how one question was resolved.
///
/// `selected == None` means the countdown expired before a choice was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    question_id: QuestionId,
    question_text: String,
    selected: Option<String>,
    correct_answer: String,
    is_correct: bool,
    points: i64,
}

impl AnswerRecord {
    /// Grade `selected` against `question` and snapshot the question text.
    #[must_use]
    pub fn grade(question: &Question, selected: Option<String>) -> Self {
        let outcome = ScoringPolicy::classify(selected.as_deref(), question.correct_answer());
        Self {
            question_id: question.id(),
            question_text: question.prompt().to_owned(),
            selected,
            correct_answer: question.correct_answer().to_owned(),
            is_correct: outcome.is_correct(),
            points: ScoringPolicy::points(outcome),
        }
    }

    /// Rehydrate a record from storage, re-deriving correctness and points.
    #[must_use]
    pub fn from_persisted(
        question_id: QuestionId,
        question_text: String,
        selected: Option<String>,
        correct_answer: String,
    ) -> Self {
        let outcome = ScoringPolicy::classify(selected.as_deref(), &correct_answer);
        Self {
            question_id,
            question_text,
            selected,
            correct_answer,
            is_correct: outcome.is_correct(),
            points: ScoringPolicy::points(outcome),
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn points(&self) -> i64 {
        self.points
    }

    #[must_use]
    pub fn outcome(&self) -> AnswerOutcome {
        ScoringPolicy::classify(self.selected(), &self.correct_answer)
    }
}
