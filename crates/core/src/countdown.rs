use crate::model::TimeLimit;

/// Result of feeding one elapsed second to a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Time was deducted; `remaining` seconds are left.
    Ticked { remaining: u32 },
    /// The budget ran out. Reported once per `start`.
    Expired,
    /// The countdown is idle, cancelled, or already expired.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// Per-question timer driven by external once-per-second ticks.
///
/// The countdown does not own a clock; the session runner feeds it ticks so
/// expiry is ordered with user input on the same event queue.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: CountdownState::Idle,
        }
    }

    /// Reset to a full budget and begin accepting ticks.
    pub fn start(&mut self, budget: TimeLimit) {
        self.remaining = budget.secs();
        self.state = CountdownState::Running;
    }

    /// Deduct one second.
    ///
    /// A tick that would take the remaining time below zero fires
    /// [`CountdownTick::Expired`] instead and stops the countdown.
    pub fn tick(&mut self) -> CountdownTick {
        if self.state != CountdownState::Running {
            return CountdownTick::Inactive;
        }

        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            return CountdownTick::Expired;
        }

        self.remaining -= 1;
        CountdownTick::Ticked {
            remaining: self.remaining,
        }
    }

    /// Stop without firing expiry. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Cancelled;
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}
