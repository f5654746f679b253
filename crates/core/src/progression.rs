use serde::{Deserialize, Serialize};

/// XP required per level.
pub const XP_PER_LEVEL: u64 = 100;

/// Outcome of applying one session's score to a player's XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionResult {
    pub prior_xp: u64,
    /// XP actually granted by the session. Never negative under [`ProgressionModel::apply`].
    pub xp_delta: i64,
    pub xp: u64,
    pub level: u64,
    /// Progress through the current level, `0..100`.
    pub percent_to_next: u8,
}

impl ProgressionResult {
    #[must_use]
    pub fn prior_level(&self) -> u64 {
        ProgressionModel::level_for(self.prior_xp)
    }

    #[must_use]
    pub fn levels_gained(&self) -> u64 {
        self.level.saturating_sub(self.prior_level())
    }
}

/// Maps accumulated XP to levels.
///
/// Only positive session scores grant XP; a losing session leaves standing
/// XP untouched, so lifetime XP never drops below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressionModel;

impl ProgressionModel {
    /// Apply a session score to `prior_xp`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiz_core::ProgressionModel;
    /// let result = ProgressionModel::apply(95, 10);
    /// assert_eq!(result.xp, 105);
    /// assert_eq!(result.level, 2);
    /// assert_eq!(result.percent_to_next, 5);
    /// ```
    #[must_use]
    pub fn apply(prior_xp: u64, score_delta: i64) -> ProgressionResult {
        let gained = u64::try_from(score_delta.max(0)).unwrap_or(0);
        let xp = prior_xp.saturating_add(gained);
        ProgressionResult {
            prior_xp,
            xp_delta: i64::try_from(gained).unwrap_or(i64::MAX),
            xp,
            level: Self::level_for(xp),
            percent_to_next: Self::percent_to_next(xp),
        }
    }

    /// `floor(xp / 100) + 1`.
    #[must_use]
    pub fn level_for(xp: u64) -> u64 {
        xp / XP_PER_LEVEL + 1
    }

    /// `xp mod 100`.
    #[must_use]
    pub fn percent_to_next(xp: u64) -> u8 {
        u8::try_from(xp % XP_PER_LEVEL).unwrap_or(0)
    }
}
