use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerRecord, Question, QuestionSet, SessionConfig, SessionSummary};
use quiz_core::{Countdown, CountdownTick, ProgressionModel, ProgressionResult};
use tracing::{debug, info, warn};

use super::progress::SessionProgress;

//
// ─── PHASES, EVENTS, OUTPUTS ───────────────────────────────────────────────────
//

/// Where a quiz session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the question set.
    Loading,
    /// Question `i` is on screen and its countdown is running.
    AwaitingAnswer(usize),
    /// Question `i` has been answered or timed out; feedback is showing.
    Locked(usize),
    Finished,
    /// The supplied question set was empty. No score, no summary.
    Empty,
    /// The session was abandoned before finishing.
    Cancelled,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Empty | Self::Cancelled)
    }
}

/// Input to the transition function. Events are applied strictly in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Load(Arc<QuestionSet>),
    Select { index: usize, option: String },
    /// One second elapsed on question `index`.
    Tick { index: usize },
    /// The feedback delay after locking question `index` has passed.
    Advance { index: usize },
    Abort,
}

/// Side effects the driver must act on after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    QuestionStarted {
        index: usize,
        question: Question,
        progress: SessionProgress,
    },
    Ticked {
        index: usize,
        progress: SessionProgress,
    },
    AnswerLocked {
        index: usize,
        record: AnswerRecord,
        score: i64,
    },
    /// Deliver `SessionEvent::Advance { index }` after `delay`.
    AdvanceScheduled {
        index: usize,
        delay: Duration,
    },
    Finished {
        summary: SessionSummary,
        progression: ProgressionResult,
    },
    Empty,
    Cancelled,
}

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Single-owner quiz session state machine.
///
/// All inputs (user selections, countdown ticks, delayed advances) go through
/// one queue and one transition function, so when a selection and an expiry
/// race for the same question, whichever was enqueued first locks it and the
/// other becomes a no-op. Exactly one [`AnswerRecord`] is produced per
/// question.
pub struct SessionStateMachine {
    config: SessionConfig,
    prior_xp: u64,
    questions: Arc<QuestionSet>,
    phase: SessionPhase,
    countdown: Countdown,
    score: i64,
    answers: Vec<AnswerRecord>,
    queue: VecDeque<SessionEvent>,
    started_at: Option<DateTime<Utc>>,
    summary: Option<SessionSummary>,
    progression: Option<ProgressionResult>,
}

impl SessionStateMachine {
    /// Create a machine in `Loading`.
    ///
    /// `prior_xp` is the player's XP read from the profile store before the
    /// session; it feeds the progression computed on `Finished`.
    #[must_use]
    pub fn new(config: SessionConfig, prior_xp: u64) -> Self {
        Self {
            config,
            prior_xp,
            questions: Arc::new(QuestionSet::empty()),
            phase: SessionPhase::Loading,
            countdown: Countdown::new(),
            score: 0,
            answers: Vec::new(),
            queue: VecDeque::new(),
            started_at: None,
            summary: None,
            progression: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn progression(&self) -> Option<ProgressionResult> {
        self.progression
    }

    /// Seconds left on the active question, `0` when none is active.
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        match self.phase {
            SessionPhase::AwaitingAnswer(_) => self.countdown.remaining(),
            _ => 0,
        }
    }

    /// Index of the question currently awaiting an answer.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        match self.phase {
            SessionPhase::AwaitingAnswer(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            score: self.score,
            time_remaining: self.time_remaining(),
            is_complete: self.phase == SessionPhase::Finished,
        }
    }

    /// Append an event to the queue without applying it.
    pub fn enqueue(&mut self, event: SessionEvent) {
        self.queue.push_back(event);
    }

    /// Apply every queued event in arrival order.
    pub fn process_pending(&mut self, now: DateTime<Utc>) -> Vec<SessionOutput> {
        let mut outputs = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            outputs.extend(self.handle(event, now));
        }
        outputs
    }

    /// The transition function.
    ///
    /// `now` should come from the services layer clock; it stamps the session
    /// start (on `Load`) and completion (on the final `Advance`).
    pub fn handle(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Vec<SessionOutput> {
        if self.phase.is_terminal() {
            debug!(phase = ?self.phase, ?event, "event after session end dropped");
            return Vec::new();
        }

        match event {
            SessionEvent::Load(questions) => self.on_load(questions, now),
            SessionEvent::Select { index, option } => self.on_select(index, option),
            SessionEvent::Tick { index } => self.on_tick(index),
            SessionEvent::Advance { index } => self.on_advance(index, now),
            SessionEvent::Abort => self.on_abort(),
        }
    }

    fn on_load(&mut self, questions: Arc<QuestionSet>, now: DateTime<Utc>) -> Vec<SessionOutput> {
        if self.phase != SessionPhase::Loading {
            debug!(phase = ?self.phase, "duplicate question set dropped");
            return Vec::new();
        }

        for question in questions.iter().filter(|q| !q.answer_is_offered()) {
            warn!(
                question_id = %question.id(),
                "correct answer is not among the options; question cannot be answered correctly"
            );
        }

        self.questions = questions;
        if self.questions.is_empty() {
            info!("no questions available");
            self.phase = SessionPhase::Empty;
            return vec![SessionOutput::Empty];
        }

        self.started_at = Some(now);
        info!(
            total = self.questions.len(),
            difficulty = %self.config.difficulty(),
            "quiz session started"
        );
        self.start_question(0).into_iter().collect()
    }

    fn on_select(&mut self, index: usize, option: String) -> Vec<SessionOutput> {
        let SessionPhase::AwaitingAnswer(active) = self.phase else {
            debug!(index, phase = ?self.phase, "selection outside answer window dropped");
            return Vec::new();
        };
        if active != index {
            debug!(index, active, "selection for inactive question dropped");
            return Vec::new();
        }
        let offered = self
            .questions
            .get(index)
            .is_some_and(|question| question.offers(&option));
        if !offered {
            debug!(index, %option, "selection is not an offered option");
            return Vec::new();
        }

        self.lock(index, Some(option))
    }

    fn on_tick(&mut self, index: usize) -> Vec<SessionOutput> {
        if self.phase != SessionPhase::AwaitingAnswer(index) {
            debug!(index, phase = ?self.phase, "stale tick dropped");
            return Vec::new();
        }

        match self.countdown.tick() {
            CountdownTick::Ticked { .. } => vec![SessionOutput::Ticked {
                index,
                progress: self.progress(),
            }],
            CountdownTick::Expired => {
                debug!(index, "question timed out");
                self.lock(index, None)
            }
            CountdownTick::Inactive => Vec::new(),
        }
    }

    fn lock(&mut self, index: usize, selected: Option<String>) -> Vec<SessionOutput> {
        let Some(question) = self.questions.get(index) else {
            return Vec::new();
        };

        self.countdown.cancel();
        let record = AnswerRecord::grade(question, selected);
        self.score += record.points();
        self.answers.push(record.clone());
        self.phase = SessionPhase::Locked(index);

        vec![
            SessionOutput::AnswerLocked {
                index,
                record,
                score: self.score,
            },
            SessionOutput::AdvanceScheduled {
                index,
                delay: self.config.display_delay(),
            },
        ]
    }

    fn on_advance(&mut self, index: usize, now: DateTime<Utc>) -> Vec<SessionOutput> {
        if self.phase != SessionPhase::Locked(index) {
            debug!(index, phase = ?self.phase, "stale advance dropped");
            return Vec::new();
        }

        let next = index + 1;
        if next < self.questions.len() {
            return self.start_question(next).into_iter().collect();
        }

        self.finish(now)
    }

    fn start_question(&mut self, index: usize) -> Option<SessionOutput> {
        let question = self.questions.get(index)?.clone();
        self.countdown.start(self.config.time_limit());
        self.phase = SessionPhase::AwaitingAnswer(index);
        Some(SessionOutput::QuestionStarted {
            index,
            question,
            progress: self.progress(),
        })
    }

    fn finish(&mut self, now: DateTime<Utc>) -> Vec<SessionOutput> {
        let started_at = self.started_at.unwrap_or(now);
        let completed_at = now.max(started_at);
        let summary = match SessionSummary::from_answers(
            self.config.difficulty(),
            started_at,
            completed_at,
            self.answers.clone(),
        ) {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "could not build session summary");
                self.phase = SessionPhase::Cancelled;
                return vec![SessionOutput::Cancelled];
            }
        };

        let progression = ProgressionModel::apply(self.prior_xp, summary.score());
        self.phase = SessionPhase::Finished;
        info!(
            score = summary.score(),
            total = summary.total_questions(),
            time_taken = summary.time_taken_secs(),
            xp = progression.xp,
            "quiz session finished"
        );

        self.summary = Some(summary.clone());
        self.progression = Some(progression);
        vec![SessionOutput::Finished {
            summary,
            progression,
        }]
    }

    fn on_abort(&mut self) -> Vec<SessionOutput> {
        self.countdown.cancel();
        self.phase = SessionPhase::Cancelled;
        info!(answered = self.answers.len(), "quiz session cancelled");
        vec![SessionOutput::Cancelled]
    }
}

impl fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("score", &self.score)
            .field("answers_len", &self.answers.len())
            .field("pending", &self.queue.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use quiz_core::model::{Difficulty, QuestionId, TimeLimit};
    use quiz_core::time::fixed_now;

    fn question(id: u64, options: &[&str], answer: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            options.iter().map(|o| (*o).to_string()).collect(),
            answer,
        )
        .unwrap()
    }

    fn two_question_set() -> Arc<QuestionSet> {
        Arc::new(QuestionSet::new(vec![
            question(1, &["A", "B"], "A"),
            question(2, &["C", "D"], "D"),
        ]))
    }

    fn machine(budget: u32) -> SessionStateMachine {
        let config = SessionConfig::new(TimeLimit::from_secs(budget).unwrap(), Difficulty::Moderate);
        SessionStateMachine::new(config, 0)
    }

    fn select(index: usize, option: &str) -> SessionEvent {
        SessionEvent::Select {
            index,
            option: option.to_string(),
        }
    }

    fn expire(machine: &mut SessionStateMachine, index: usize, budget: u32) {
        for _ in 0..=budget {
            machine.handle(SessionEvent::Tick { index }, fixed_now());
        }
    }

    #[test]
    fn load_starts_first_question_with_full_budget() {
        let mut m = machine(10);
        let out = m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        assert_eq!(m.phase(), SessionPhase::AwaitingAnswer(0));
        assert_eq!(m.time_remaining(), 10);
        assert_eq!(m.started_at(), Some(fixed_now()));
        let [SessionOutput::QuestionStarted { index: 0, progress, .. }] = out.as_slice() else {
            panic!("expected first question, got {out:?}");
        };
        assert_eq!(progress.total, 2);
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.time_remaining, 10);
    }

    #[test]
    fn empty_set_is_terminal_without_summary() {
        let mut m = machine(10);
        let out = m.handle(SessionEvent::Load(Arc::new(QuestionSet::empty())), fixed_now());

        assert_eq!(out, vec![SessionOutput::Empty]);
        assert_eq!(m.phase(), SessionPhase::Empty);
        assert!(m.summary().is_none());
        assert!(m.progression().is_none());
        assert!(m.handle(SessionEvent::Tick { index: 0 }, fixed_now()).is_empty());
        assert!(m.handle(select(0, "A"), fixed_now()).is_empty());
    }

    #[test]
    fn tick_before_load_is_ignored() {
        let mut m = machine(10);
        assert!(m.handle(SessionEvent::Tick { index: 0 }, fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::Loading);
    }

    #[test]
    fn selection_locks_and_schedules_advance() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        let out = m.handle(select(0, "A"), fixed_now());

        assert_eq!(m.phase(), SessionPhase::Locked(0));
        assert_eq!(m.score(), 5);
        assert_eq!(m.answers().len(), 1);
        assert!(matches!(
            &out[..],
            [
                SessionOutput::AnswerLocked { index: 0, score: 5, .. },
                SessionOutput::AdvanceScheduled { index: 0, .. }
            ]
        ));
    }

    #[test]
    fn second_selection_on_locked_question_is_ignored() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(select(0, "B"), fixed_now());

        assert!(m.handle(select(0, "A"), fixed_now()).is_empty());
        assert_eq!(m.answers().len(), 1);
        assert_eq!(m.score(), -1);
    }

    #[test]
    fn selection_for_other_index_is_rejected() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        assert!(m.handle(select(1, "D"), fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::AwaitingAnswer(0));
        assert!(m.answers().is_empty());
    }

    #[test]
    fn selection_of_unoffered_option_is_rejected() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        assert!(m.handle(select(0, "Z"), fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::AwaitingAnswer(0));
    }

    #[test]
    fn countdown_expiry_locks_with_no_selection() {
        let mut m = machine(2);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        let first = m.handle(SessionEvent::Tick { index: 0 }, fixed_now());
        assert_eq!(
            first,
            vec![SessionOutput::Ticked {
                index: 0,
                progress: SessionProgress {
                    total: 2,
                    answered: 0,
                    remaining: 2,
                    score: 0,
                    time_remaining: 1,
                    is_complete: false,
                },
            }]
        );
        m.handle(SessionEvent::Tick { index: 0 }, fixed_now());
        assert_eq!(m.phase(), SessionPhase::AwaitingAnswer(0));

        let out = m.handle(SessionEvent::Tick { index: 0 }, fixed_now());
        assert_eq!(m.phase(), SessionPhase::Locked(0));
        let SessionOutput::AnswerLocked { record, score, .. } = &out[0] else {
            panic!("expected lock, got {out:?}");
        };
        assert_eq!(record.selected(), None);
        assert!(!record.is_correct());
        assert_eq!(*score, -1);
    }

    #[test]
    fn expiry_first_wins_over_selection() {
        let mut m = machine(1);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(SessionEvent::Tick { index: 0 }, fixed_now());

        m.enqueue(SessionEvent::Tick { index: 0 });
        m.enqueue(select(0, "A"));
        m.process_pending(fixed_now());

        assert_eq!(m.answers().len(), 1);
        assert_eq!(m.answers()[0].selected(), None);
        assert!(!m.answers()[0].is_correct());
        assert_eq!(m.score(), -1);
    }

    #[test]
    fn selection_first_wins_over_expiry() {
        let mut m = machine(1);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(SessionEvent::Tick { index: 0 }, fixed_now());

        m.enqueue(select(0, "A"));
        m.enqueue(SessionEvent::Tick { index: 0 });
        m.process_pending(fixed_now());

        assert_eq!(m.answers().len(), 1);
        assert_eq!(m.answers()[0].selected(), Some("A"));
        assert!(m.answers()[0].is_correct());
        assert_eq!(m.score(), 5);
    }

    #[test]
    fn stale_tick_does_not_touch_next_question() {
        let mut m = machine(3);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(select(0, "A"), fixed_now());
        m.handle(SessionEvent::Advance { index: 0 }, fixed_now());

        assert!(m.handle(SessionEvent::Tick { index: 0 }, fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::AwaitingAnswer(1));
        assert_eq!(m.time_remaining(), 3);
    }

    #[test]
    fn advance_requires_matching_locked_index() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());

        assert!(m.handle(SessionEvent::Advance { index: 0 }, fixed_now()).is_empty());
        m.handle(select(0, "A"), fixed_now());
        assert!(m.handle(SessionEvent::Advance { index: 1 }, fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::Locked(0));
    }

    #[test]
    fn end_to_end_select_then_timeout() {
        let start = fixed_now();
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), start);

        m.handle(select(0, "A"), start);
        assert_eq!(m.score(), 5);
        m.handle(SessionEvent::Advance { index: 0 }, start);

        expire(&mut m, 1, 10);
        assert_eq!(m.score(), 4);

        let end = start + ChronoDuration::milliseconds(14_500);
        let out = m.handle(SessionEvent::Advance { index: 1 }, end);

        let [SessionOutput::Finished { summary, progression }] = out.as_slice() else {
            panic!("expected finish, got {out:?}");
        };
        assert_eq!(summary.score(), 4);
        assert_eq!(summary.total_questions(), 2);
        assert!((summary.time_taken_secs() - 14.5).abs() < 1e-9);
        assert_eq!(summary.difficulty(), Difficulty::Moderate);

        let answers = summary.answers();
        assert!(answers[0].is_correct());
        assert_eq!(answers[0].selected(), Some("A"));
        assert!(!answers[1].is_correct());
        assert_eq!(answers[1].selected(), None);
        assert_eq!(answers[1].correct_answer(), "D");

        assert_eq!(progression.xp, 4);
        assert_eq!(m.phase(), SessionPhase::Finished);
        assert!(m.progress().is_complete);
    }

    #[test]
    fn terminal_transition_twice_keeps_summary() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(select(0, "A"), fixed_now());
        m.handle(SessionEvent::Advance { index: 0 }, fixed_now());
        m.handle(select(1, "D"), fixed_now());
        m.handle(SessionEvent::Advance { index: 1 }, fixed_now());
        let first = m.summary().cloned().unwrap();

        let later = fixed_now() + ChronoDuration::seconds(30);
        assert!(m.handle(SessionEvent::Advance { index: 1 }, later).is_empty());
        assert!(m.handle(SessionEvent::Abort, later).is_empty());

        assert_eq!(m.summary(), Some(&first));
        assert_eq!(m.phase(), SessionPhase::Finished);
    }

    #[test]
    fn completed_session_has_one_record_per_question_in_order() {
        let set: Arc<QuestionSet> = Arc::new(
            (1..=5)
                .map(|id| question(id, &["yes", "no"], "yes"))
                .collect(),
        );
        let mut m = machine(4);
        m.handle(SessionEvent::Load(Arc::clone(&set)), fixed_now());

        for index in 0..set.len() {
            if index % 2 == 0 {
                m.handle(select(index, "yes"), fixed_now());
            } else {
                expire(&mut m, index, 4);
            }
            m.handle(SessionEvent::Advance { index }, fixed_now());
        }

        let summary = m.summary().unwrap();
        let ids: Vec<u64> = summary.answers().iter().map(|a| a.question_id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(summary.score(), 3 * 5 - 2);
    }

    #[test]
    fn abort_cancels_and_suppresses_pending_advance() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(select(0, "A"), fixed_now());

        assert_eq!(m.handle(SessionEvent::Abort, fixed_now()), vec![SessionOutput::Cancelled]);
        assert!(m.handle(SessionEvent::Advance { index: 0 }, fixed_now()).is_empty());
        assert_eq!(m.phase(), SessionPhase::Cancelled);
        assert!(m.summary().is_none());
    }

    #[test]
    fn score_may_end_negative() {
        let mut m = machine(10);
        m.handle(SessionEvent::Load(two_question_set()), fixed_now());
        m.handle(select(0, "B"), fixed_now());
        m.handle(SessionEvent::Advance { index: 0 }, fixed_now());
        m.handle(select(1, "C"), fixed_now());
        m.handle(SessionEvent::Advance { index: 1 }, fixed_now());

        let summary = m.summary().unwrap();
        assert_eq!(summary.score(), -2);
        assert_eq!(m.progression().unwrap().xp, 0);
    }

    #[test]
    fn question_with_unoffered_answer_is_always_incorrect() {
        let set = Arc::new(QuestionSet::new(vec![question(9, &["A", "B"], "C")]));
        let mut m = machine(10);
        m.handle(SessionEvent::Load(set), fixed_now());
        m.handle(select(0, "A"), fixed_now());

        assert!(!m.answers()[0].is_correct());
        assert_eq!(m.score(), -1);
    }
}
