use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerRecord, Difficulty};
use crate::time::elapsed_secs;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },

    #[error("total questions ({total}) does not match answer count ({answers})")]
    CountMismatch { total: u32, answers: usize },

    #[error("score ({score}) does not match answer points ({sum})")]
    ScoreMismatch { score: i64, sum: i64 },
}

/// Terminal result of a finished quiz session. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    score: i64,
    total_questions: u32,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    answers: Vec<AnswerRecord>,
}

impl SessionSummary {
    /// Build a summary from the ordered answer log of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::TooManyAnswers` if the answer count cannot fit in `u32`.
    pub fn from_answers(
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, SessionSummaryError> {
        let total_questions = u32::try_from(answers.len())
            .map_err(|_| SessionSummaryError::TooManyAnswers { len: answers.len() })?;
        let score = answers.iter().map(AnswerRecord::points).sum();
        Self::from_persisted(
            score,
            total_questions,
            difficulty,
            started_at,
            completed_at,
            answers,
        )
    }

    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError` if timestamps, counts or score do not line up.
    pub fn from_persisted(
        score: i64,
        total_questions: u32,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if usize::try_from(total_questions).ok() != Some(answers.len()) {
            return Err(SessionSummaryError::CountMismatch {
                total: total_questions,
                answers: answers.len(),
            });
        }
        let sum: i64 = answers.iter().map(AnswerRecord::points).sum();
        if sum != score {
            return Err(SessionSummaryError::ScoreMismatch { score, sum });
        }

        Ok(Self {
            score,
            total_questions,
            difficulty,
            started_at,
            completed_at,
            answers,
        })
    }

    #[must_use]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wall-clock seconds from the first question to the terminal transition.
    #[must_use]
    pub fn time_taken_secs(&self) -> f64 {
        elapsed_secs(self.started_at, self.completed_at)
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        let correct = self.answers.iter().filter(|a| a.is_correct()).count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn record(id: u64, selected: Option<&str>) -> AnswerRecord {
        let q = Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".into(), "B".into()],
            "A",
        )
        .unwrap();
        AnswerRecord::grade(&q, selected.map(str::to_string))
    }

    #[test]
    fn summary_totals_answers() {
        let start = fixed_now();
        let end = start + Duration::milliseconds(4_250);
        let answers = vec![record(1, Some("A")), record(2, None), record(3, Some("B"))];

        let summary = SessionSummary::from_answers(Difficulty::Expert, start, end, answers).unwrap();

        assert_eq!(summary.score(), 3);
        assert_eq!(summary.total_questions(), 3);
        assert_eq!(summary.correct_count(), 1);
        assert_eq!(summary.difficulty(), Difficulty::Expert);
        assert!((summary.time_taken_secs() - 4.25).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_time_range() {
        let start = fixed_now();
        let err = SessionSummary::from_answers(
            Difficulty::Moderate,
            start,
            start - Duration::seconds(1),
            vec![record(1, Some("A"))],
        )
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn persisted_summary_must_match_answers() {
        let now = fixed_now();
        let err = SessionSummary::from_persisted(
            10,
            1,
            Difficulty::Moderate,
            now,
            now,
            vec![record(1, Some("A"))],
        )
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::ScoreMismatch { score: 10, sum: 5 });

        let err = SessionSummary::from_persisted(5, 2, Difficulty::Moderate, now, now, vec![
            record(1, Some("A")),
        ])
        .unwrap_err();
        assert!(matches!(err, SessionSummaryError::CountMismatch { total: 2, answers: 1 }));
    }
}
