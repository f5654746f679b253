use std::sync::Arc;
use std::time::Duration;

use quiz_core::ProgressionResult;
use quiz_core::model::{QuestionSet, SessionConfig, SessionSummary};
use storage::repository::{AttemptId, AttemptRepository};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::machine::{SessionOutput, SessionStateMachine};
use super::plan::SessionPlanner;
use super::runner::{DEFAULT_TICK_PERIOD, SessionCommand, SessionOutcome, SessionRunner};
use crate::Clock;
use crate::error::SessionError;
use crate::gateway::{QuestionSource, SubmissionGateway, SubmissionPayload, SubmissionStatus};
use crate::profile_service::ProfileService;

/// Local bookkeeping for a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSession {
    pub attempt_id: AttemptId,
    pub progression: ProgressionResult,
}

/// A played session with its local record and remote submission.
///
/// The outcome survives a local storage failure; `recorded` carries that
/// error instead.
#[derive(Debug)]
pub struct PlayedSession {
    pub outcome: SessionOutcome,
    /// `Ok(None)` when the session did not finish.
    pub recorded: Result<Option<RecordedSession>, SessionError>,
    /// Detached submission, present only for finished sessions. Awaiting it
    /// is optional.
    pub submission: Option<JoinHandle<SubmissionStatus>>,
}

/// Orchestrates fetching, running and recording quiz sessions.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    gateway: Arc<dyn SubmissionGateway>,
    profile: ProfileService,
    attempts: Arc<dyn AttemptRepository>,
    shuffle_questions: bool,
    tick_period: Duration,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        gateway: Arc<dyn SubmissionGateway>,
        profile: ProfileService,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            gateway,
            profile,
            attempts,
            shuffle_questions: false,
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Fetch and order the questions for one session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` when the question source fails.
    pub async fn load_questions(&self) -> Result<Arc<QuestionSet>, SessionError> {
        let fetched = self
            .questions
            .fetch_questions()
            .await
            .map_err(SessionError::Fetch)?;
        let planned = SessionPlanner::new()
            .with_shuffle(self.shuffle_questions)
            .plan(fetched);
        Ok(Arc::new(planned))
    }

    /// Fetch questions, read prior XP and run one session to its end.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if questions or the stored XP cannot be loaded.
    pub async fn run_session(
        &self,
        config: SessionConfig,
        commands: mpsc::Receiver<SessionCommand>,
        updates: mpsc::UnboundedSender<SessionOutput>,
    ) -> Result<SessionOutcome, SessionError> {
        let questions = self.load_questions().await?;
        let prior_xp = self.profile.load_xp().await?;
        let machine = SessionStateMachine::new(config, prior_xp);
        let runner = SessionRunner::new(self.clock).with_tick_period(self.tick_period);
        Ok(runner.run(machine, questions, commands, updates).await)
    }

    /// Persist the attempt, then the XP it grants.
    ///
    /// `Empty` and `Cancelled` outcomes record nothing. XP is only granted
    /// once the attempt row exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if either write fails. When the attempt write
    /// fails, XP is left untouched.
    pub async fn record_outcome(
        &self,
        outcome: &SessionOutcome,
    ) -> Result<Option<RecordedSession>, SessionError> {
        let Some(summary) = outcome.summary() else {
            return Ok(None);
        };

        let attempt_id = self.attempts.append_attempt(summary).await?;
        let progression = self.profile.apply_session(summary.score()).await?;
        info!(attempt_id, xp = progression.xp, level = progression.level, "attempt recorded");

        Ok(Some(RecordedSession {
            attempt_id,
            progression,
        }))
    }

    /// Run a session, submit it and record it locally.
    ///
    /// The submission is spawned before any local write.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only when the session cannot start (questions
    /// or prior XP unavailable). Local persistence failures are reported in
    /// `PlayedSession::recorded`.
    pub async fn play(
        &self,
        config: SessionConfig,
        commands: mpsc::Receiver<SessionCommand>,
        updates: mpsc::UnboundedSender<SessionOutput>,
    ) -> Result<PlayedSession, SessionError> {
        let outcome = self.run_session(config, commands, updates).await?;
        let submission = outcome
            .summary()
            .map(|summary| self.submit_detached(summary));
        let recorded = self.record_outcome(&outcome).await;
        if let Err(err) = &recorded {
            warn!(error = %err, "finished session could not be recorded locally");
        }
        Ok(PlayedSession {
            outcome,
            recorded,
            submission,
        })
    }

    /// Submit once, off the caller's task. Failures are logged, never retried.
    fn submit_detached(&self, summary: &SessionSummary) -> JoinHandle<SubmissionStatus> {
        let gateway = Arc::clone(&self.gateway);
        let payload = SubmissionPayload::from_summary(summary);
        tokio::spawn(async move {
            match gateway.submit(&payload).await {
                Ok(()) => SubmissionStatus::Submitted,
                Err(err) => {
                    warn!(error = %err, "quiz submission failed");
                    SubmissionStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            }
        })
    }
}
