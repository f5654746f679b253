use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::QuestionSet;

/// Orders a fetched question set for one session.
///
/// Source order is kept unless shuffling is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPlanner {
    shuffle: bool,
}

impl SessionPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn plan(self, questions: QuestionSet) -> QuestionSet {
        if !self.shuffle {
            return questions;
        }

        let mut questions = questions.into_questions();
        let mut rng = rng();
        questions.as_mut_slice().shuffle(&mut rng);
        QuestionSet::new(questions)
    }
}
