mod machine;
mod plan;
mod progress;
mod runner;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use machine::{SessionEvent, SessionOutput, SessionPhase, SessionStateMachine};
pub use plan::SessionPlanner;
pub use progress::SessionProgress;
pub use runner::{DEFAULT_TICK_PERIOD, SessionCommand, SessionOutcome, SessionRunner};
pub use view::{AttemptListItem, HistoryService};
pub use workflow::{PlayedSession, QuizLoopService, RecordedSession};
