use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} offers option {option:?} more than once")]
    DuplicateOption { id: QuestionId, option: String },
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, immutable once loaded.
///
/// Options keep their server order and are unique within the question. The
/// correct answer is normally one of the options; when it is not, the
/// question is still playable but can never be answered correctly
/// (see [`Question::answer_is_offered`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Validate and build a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoOptions` for an empty option list and
    /// `QuestionError::DuplicateOption` when an option repeats.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption {
                    id,
                    option: option.clone(),
                });
            }
        }

        Ok(Self {
            id,
            prompt: prompt.into(),
            options,
            correct_answer: correct_answer.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Whether `option` is one of the offered choices.
    #[must_use]
    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// False when the server's answer is not among the options.
    #[must_use]
    pub fn answer_is_offered(&self) -> bool {
        self.offers(&self.correct_answer)
    }
}

//
// ─── QUESTION SET ─────────────────────────────────────────────────────────────
//

/// Ordered, read-only list of questions for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl FromIterator<Question> for QuestionSet {
    fn from_iter<T: IntoIterator<Item = Question>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(QuestionId::new(1), "2 + 2?", opts(&["3", "4"]), "4").unwrap();
        assert_eq!(q.prompt(), "2 + 2?");
        assert_eq!(q.options(), &["3".to_string(), "4".to_string()]);
        assert!(q.answer_is_offered());
        assert!(q.offers("3"));
        assert!(!q.offers("5"));
    }

    #[test]
    fn rejects_empty_options() {
        let err = Question::new(QuestionId::new(1), "?", Vec::new(), "A").unwrap_err();
        assert_eq!(err, QuestionError::NoOptions { id: QuestionId::new(1) });
    }

    #[test]
    fn rejects_duplicate_options() {
        let err = Question::new(QuestionId::new(2), "?", opts(&["A", "B", "A"]), "A").unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { option, .. } if option == "A"));
    }

    #[test]
    fn accepts_answer_outside_options() {
        let q = Question::new(QuestionId::new(3), "?", opts(&["A", "B"]), "C").unwrap();
        assert!(!q.answer_is_offered());
    }

    #[test]
    fn question_set_preserves_order() {
        let set: QuestionSet = (1..=3)
            .map(|id| Question::new(QuestionId::new(id), "?", opts(&["A"]), "A").unwrap())
            .collect();
        assert_eq!(set.len(), 3);
        let ids: Vec<u64> = set.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(QuestionSet::empty().is_empty());
    }
}
