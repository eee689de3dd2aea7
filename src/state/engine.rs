//! Countdown engine state machine

use serde::{Deserialize, Serialize};

/// Default countdown duration when none is configured (10 minutes)
pub const DEFAULT_DURATION_SECS: u64 = 600;

/// Remaining-time threshold below which the near-end warning (and the
/// countdown cue window) applies
pub const NEAR_END_SECS: u64 = 10;

/// Timer state, exhaustive. Reaching zero does not auto-transition back to
/// `Idle`: the engine stays `Running` at zero with further ticks suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Snapshot of the observable timer state, published after every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_seconds: u64,
}

/// The countdown session. Owned exclusively by the engine; all mutation goes
/// through the transition methods below, which silently reject anything
/// invalid in the current state.
#[derive(Debug)]
pub struct CountdownEngine {
    state: TimerState,
    remaining_seconds: u64,
    configured_seconds: u64,
}

impl CountdownEngine {
    /// Create a new idle engine displaying the configured duration
    pub fn new(configured_seconds: u64) -> Self {
        Self {
            state: TimerState::Idle,
            remaining_seconds: configured_seconds,
            configured_seconds,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn configured_seconds(&self) -> u64 {
        self.configured_seconds
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Start the countdown from `Idle`
    ///
    /// A committed keypad duration takes precedence; with no pending input the
    /// engine falls back to the configured duration, unless the session was
    /// cleared to zero, in which case there is nothing to start. A committed
    /// duration of zero is rejected without mutating the session.
    pub fn start(&mut self, pending_seconds: Option<u64>) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        let next = match pending_seconds {
            Some(seconds) => seconds,
            None if self.remaining_seconds > 0 => self.configured_seconds,
            None => return false,
        };
        if next == 0 {
            return false;
        }
        self.remaining_seconds = next;
        self.state = TimerState::Running;
        true
    }

    /// Toggle between `Running` and `Paused`
    ///
    /// Rejected at zero remaining in either direction: a finished countdown
    /// can only be reset.
    pub fn pause_or_resume(&mut self) -> bool {
        match self.state {
            TimerState::Running if self.remaining_seconds > 0 => {
                self.state = TimerState::Paused;
                true
            }
            TimerState::Paused if self.remaining_seconds > 0 => {
                self.state = TimerState::Running;
                true
            }
            _ => false,
        }
    }

    /// Advance the countdown by one second, floored at zero
    ///
    /// Only the owning tick source calls this, and only while `Running`.
    pub fn tick(&mut self) -> u64 {
        if self.state == TimerState::Running && self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        self.remaining_seconds
    }

    /// Reset to `Idle` with the configured duration restored
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_seconds = self.configured_seconds;
    }

    /// Zero the session and force `Idle` (keypad CLEAR side effect)
    pub fn clear(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_seconds = 0;
    }

    /// Label for the primary action button, a pure function of state
    pub fn button_label(&self) -> &'static str {
        match self.state {
            TimerState::Idle => "Start",
            TimerState::Running => "Pause",
            TimerState::Paused => "Resume",
        }
    }

    /// Whether the primary action would be a no-op and should be disabled
    pub fn primary_action_disabled(&self, pending_empty: bool) -> bool {
        match self.state {
            TimerState::Idle => pending_empty && self.remaining_seconds == 0,
            _ => self.remaining_seconds == 0,
        }
    }

    /// Near-end visual warning, true over the final cue window
    pub fn near_end(&self) -> bool {
        self.remaining_seconds <= NEAR_END_SECS
    }
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}
