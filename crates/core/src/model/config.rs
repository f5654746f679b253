use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default pause between locking an answer and moving on, in milliseconds.
pub const DEFAULT_DISPLAY_DELAY_MS: u64 = 1_500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("time limit must be a positive number of seconds")]
    ZeroTimeLimit,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── TIME LIMIT ───────────────────────────────────────────────────────────────
//

/// Per-question countdown budget in whole seconds, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimeLimit(NonZeroU32);

impl TimeLimit {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroTimeLimit` for `0`.
    pub fn from_secs(secs: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(secs)
            .map(Self)
            .ok_or(ConfigError::ZeroTimeLimit)
    }

    #[must_use]
    pub fn secs(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for TimeLimit {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_secs(value)
    }
}

impl From<TimeLimit> for u32 {
    fn from(value: TimeLimit) -> Self {
        value.secs()
    }
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Difficulty label attached to a session and reported with its summary.
///
/// Each label has a preset budget, but callers may pair any label with any
/// [`TimeLimit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// 20 seconds per question.
    Beginner,
    /// 10 seconds per question.
    #[default]
    Moderate,
    /// 5 seconds per question.
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Moderate, Self::Expert];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Moderate => "Moderate",
            Difficulty::Expert => "Expert",
        }
    }

    #[must_use]
    pub fn preset_time_limit(self) -> TimeLimit {
        const BEGINNER: NonZeroU32 = NonZeroU32::new(20).unwrap();
        const MODERATE: NonZeroU32 = NonZeroU32::new(10).unwrap();
        const EXPERT: NonZeroU32 = NonZeroU32::new(5).unwrap();

        TimeLimit(match self {
            Difficulty::Beginner => BEGINNER,
            Difficulty::Moderate => MODERATE,
            Difficulty::Expert => EXPERT,
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDifficulty(s.to_string()))
    }
}

//
// ─── SESSION CONFIG ───────────────────────────────────────────────────────────
//

/// Caller-supplied parameters for one quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    time_limit: TimeLimit,
    difficulty: Difficulty,
    display_delay: Duration,
}

impl SessionConfig {
    #[must_use]
    pub fn new(time_limit: TimeLimit, difficulty: Difficulty) -> Self {
        Self {
            time_limit,
            difficulty,
            display_delay: Duration::from_millis(DEFAULT_DISPLAY_DELAY_MS),
        }
    }

    /// Config using the difficulty's preset budget.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self::new(difficulty.preset_time_limit(), difficulty)
    }

    #[must_use]
    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }

    #[must_use]
    pub fn time_limit(&self) -> TimeLimit {
        self.time_limit
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn display_delay(&self) -> Duration {
        self.display_delay
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}
