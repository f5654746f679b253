use serde::{Deserialize, Serialize};

/// How a single question was resolved.
///
/// A missing selection is its own case rather than a string that fails to
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    TimedOut,
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, AnswerOutcome::Correct)
    }
}

/// Fixed reward table for a quiz answer.
///
/// Timeouts cost the same as wrong answers so stalling never pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringPolicy;

impl ScoringPolicy {
    pub const CORRECT_POINTS: i64 = 5;
    pub const INCORRECT_POINTS: i64 = -1;

    /// Classify a selection against the correct option.
    #[must_use]
    pub fn classify(selected: Option<&str>, correct: &str) -> AnswerOutcome {
        match selected {
            None => AnswerOutcome::TimedOut,
            Some(choice) if choice == correct => AnswerOutcome::Correct,
            Some(_) => AnswerOutcome::Incorrect,
        }
    }

    /// Point delta for a resolved question.
    #[must_use]
    pub fn points(outcome: AnswerOutcome) -> i64 {
        match outcome {
            AnswerOutcome::Correct => Self::CORRECT_POINTS,
            AnswerOutcome::Incorrect | AnswerOutcome::TimedOut => Self::INCORRECT_POINTS,
        }
    }

    /// Point delta for `selected` against `correct`: `+5` on a match, `-1` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiz_core::ScoringPolicy;
    /// assert_eq!(ScoringPolicy::score(Some("A"), "A"), 5);
    /// assert_eq!(ScoringPolicy::score(Some("B"), "A"), -1);
    /// assert_eq!(ScoringPolicy::score(None, "A"), -1);
    /// ```
    #[must_use]
    pub fn score(selected: Option<&str>, correct: &str) -> i64 {
        Self::points(Self::classify(selected, correct))
    }
}
