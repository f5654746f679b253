#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod model;
pub mod progression;
pub mod scoring;
pub mod time;

pub use countdown::{Countdown, CountdownTick};
pub use error::Error;
pub use progression::{ProgressionModel, ProgressionResult};
pub use scoring::{AnswerOutcome, ScoringPolicy};
pub use time::Clock;
