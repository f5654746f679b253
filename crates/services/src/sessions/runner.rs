use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{QuestionSet, SessionSummary};
use quiz_core::{Clock, ProgressionResult};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::{Instrument, debug, info_span};

use super::machine::{SessionEvent, SessionOutput, SessionPhase, SessionStateMachine};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Player input forwarded to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Select { index: usize, option: String },
    Quit,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Finished {
        summary: SessionSummary,
        progression: ProgressionResult,
    },
    Empty,
    Cancelled,
}

impl SessionOutcome {
    #[must_use]
    pub fn summary(&self) -> Option<&SessionSummary> {
        match self {
            Self::Finished { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Drives a [`SessionStateMachine`] from one task.
///
/// Commands, countdown ticks and the post-lock display delay all become
/// machine events in a single `select!` loop. The loop is biased toward
/// commands, so a selection and an expiry that are ready together resolve
/// in favour of the selection; either way only one of them locks.
#[derive(Debug, Clone, Copy)]
pub struct SessionRunner {
    clock: Clock,
    tick_period: Duration,
}

impl SessionRunner {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Run the session to a terminal state.
    ///
    /// A closed command channel is treated as [`SessionCommand::Quit`].
    /// Every machine output is forwarded to `updates`; a dropped receiver
    /// does not stop the session.
    pub async fn run(
        &self,
        mut machine: SessionStateMachine,
        questions: Arc<QuestionSet>,
        mut commands: mpsc::Receiver<SessionCommand>,
        updates: mpsc::UnboundedSender<SessionOutput>,
    ) -> SessionOutcome {
        let span = info_span!(
            "quiz_session",
            difficulty = %machine.config().difficulty(),
            questions = questions.len(),
        );

        async move {
            let mut ticker: Option<Interval> = None;
            let mut pending_advance: Option<(usize, Instant)> = None;
            machine.enqueue(SessionEvent::Load(questions));

            loop {
                for output in machine.process_pending(self.clock.now()) {
                    match &output {
                        SessionOutput::QuestionStarted { .. } => {
                            ticker = Some(self.ticker());
                        }
                        SessionOutput::AnswerLocked { .. } => ticker = None,
                        SessionOutput::AdvanceScheduled { index, delay } => {
                            pending_advance = Some((*index, Instant::now() + *delay));
                        }
                        SessionOutput::Finished { .. }
                        | SessionOutput::Empty
                        | SessionOutput::Cancelled => {
                            ticker = None;
                            pending_advance = None;
                        }
                        SessionOutput::Ticked { .. } => {}
                    }
                    if updates.send(output).is_err() {
                        debug!("session update receiver dropped");
                    }
                }

                if machine.phase().is_terminal() {
                    break;
                }

                tokio::select! {
                    biased;

                    command = commands.recv() => match command {
                        Some(SessionCommand::Select { index, option }) => {
                            machine.enqueue(SessionEvent::Select { index, option });
                        }
                        Some(SessionCommand::Quit) | None => machine.enqueue(SessionEvent::Abort),
                    },
                    () = next_tick(&mut ticker) => {
                        if let Some(index) = machine.active_index() {
                            machine.enqueue(SessionEvent::Tick { index });
                        }
                    }
                    index = advance_due(pending_advance) => {
                        pending_advance = None;
                        machine.enqueue(SessionEvent::Advance { index });
                    }
                }
            }

            outcome_of(&machine)
        }
        .instrument(span)
        .await
    }

    fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn advance_due(pending_advance: Option<(usize, Instant)>) -> usize {
    match pending_advance {
        Some((index, deadline)) => {
            sleep_until(deadline).await;
            index
        }
        None => pending().await,
    }
}

fn outcome_of(machine: &SessionStateMachine) -> SessionOutcome {
    match (machine.phase(), machine.summary(), machine.progression()) {
        (SessionPhase::Finished, Some(summary), Some(progression)) => SessionOutcome::Finished {
            summary: summary.clone(),
            progression,
        },
        (SessionPhase::Empty, _, _) => SessionOutcome::Empty,
        _ => SessionOutcome::Cancelled,
    }
}
