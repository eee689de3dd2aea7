//! Audio cue decision logic
//!
//! The cue controller is split into a pure decision function over
//! `(remaining_seconds, state)` observations and an effect executor behind
//! the [`CueSink`] trait, so the synchronization rules are testable without
//! an audio device.

use tracing::{debug, warn};

use crate::state::engine::{TimerState, NEAR_END_SECS};

/// Length of the countdown cue window in seconds
pub const CUE_WINDOW_SECS: u64 = NEAR_END_SECS;

/// What the effect executor should do in response to one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueAction {
    /// Start the countdown track seeked to `offset` seconds into the cue
    PlayCountdown { offset: u64 },
    /// Resume a paused countdown track without re-seeking
    ResumeCountdown,
    /// Pause the countdown track
    PauseCountdown,
    /// Fire the one-shot end alert
    PlayEndCue,
    NoAction,
}

/// Derived cue state, never authoritative over the engine
///
/// `last_beeped_second` suppresses duplicate countdown triggers when the same
/// observation is re-evaluated; `end_cue_played` guarantees the end alert
/// fires exactly once per completed run and is rearmed whenever remaining
/// time climbs back above zero.
#[derive(Debug, Default)]
pub struct CueTracker {
    last_beeped_second: Option<u64>,
    end_cue_played: bool,
    countdown_audible: bool,
}

impl CueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the cue action for one `(remaining, state)` observation
    pub fn decide(&mut self, remaining_seconds: u64, state: TimerState) -> CueAction {
        // Rearm the end alert once a fresh countdown is visible
        if remaining_seconds > 0 {
            self.end_cue_played = false;
        }

        if state == TimerState::Running
            && remaining_seconds > 0
            && remaining_seconds <= CUE_WINDOW_SECS
        {
            if self.last_beeped_second != Some(remaining_seconds) {
                self.last_beeped_second = Some(remaining_seconds);
                self.countdown_audible = true;
                return CueAction::PlayCountdown {
                    offset: CUE_WINDOW_SECS - remaining_seconds,
                };
            }
            if !self.countdown_audible {
                self.countdown_audible = true;
                return CueAction::ResumeCountdown;
            }
            return CueAction::NoAction;
        }

        if state == TimerState::Paused && self.countdown_audible {
            self.countdown_audible = false;
            return CueAction::PauseCountdown;
        }

        if state == TimerState::Running && remaining_seconds == 0 && !self.end_cue_played {
            self.end_cue_played = true;
            return CueAction::PlayEndCue;
        }

        CueAction::NoAction
    }

    /// Forget everything, used when a session is reset or cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Playable handles for the two cue tracks
///
/// Implementations must swallow playback failures: audio trouble never
/// surfaces to the state machine.
pub trait CueSink: Send {
    fn play_countdown_from(&mut self, offset_seconds: u64);
    fn pause_countdown(&mut self);
    fn resume_countdown(&mut self);
    fn play_end_cue(&mut self);
    /// Stop the countdown track and rewind it to the beginning
    fn stop_and_rewind(&mut self);
}

/// Observes engine snapshots and drives the cue tracks accordingly
pub struct AudioCueController {
    tracker: CueTracker,
    sink: Box<dyn CueSink>,
}

impl AudioCueController {
    pub fn new(sink: Box<dyn CueSink>) -> Self {
        Self {
            tracker: CueTracker::new(),
            sink,
        }
    }

    /// React to one `(remaining, state)` observation
    pub fn observe(&mut self, remaining_seconds: u64, state: TimerState) {
        let action = self.tracker.decide(remaining_seconds, state);
        if action != CueAction::NoAction {
            debug!("Audio cue at {}s remaining: {:?}", remaining_seconds, action);
        }
        match action {
            CueAction::PlayCountdown { offset } => self.sink.play_countdown_from(offset),
            CueAction::ResumeCountdown => self.sink.resume_countdown(),
            CueAction::PauseCountdown => self.sink.pause_countdown(),
            CueAction::PlayEndCue => self.sink.play_end_cue(),
            CueAction::NoAction => {}
        }
    }

    /// Clear cue state and stop audio, used on timer reset
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.sink.stop_and_rewind();
    }

    /// Clear cue state without touching playback, used on keypad CLEAR
    pub fn clear_tracker(&mut self) {
        self.tracker.reset();
    }
}

impl std::fmt::Debug for AudioCueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCueController")
            .field("tracker", &self.tracker)
            .finish()
    }
}

/// Cue sink that discards everything, used when no audio device is available
/// or audio is muted
pub struct SilentCueSink;

impl CueSink for SilentCueSink {
    fn play_countdown_from(&mut self, offset_seconds: u64) {
        debug!("Muted: countdown cue from {}s skipped", offset_seconds);
    }

    fn pause_countdown(&mut self) {}

    fn resume_countdown(&mut self) {}

    fn play_end_cue(&mut self) {
        debug!("Muted: end cue skipped");
    }

    fn stop_and_rewind(&mut self) {}
}

/// Log-and-swallow helper for playback errors
pub(crate) fn swallow_playback_error<E: std::fmt::Display>(what: &str, err: E) {
    warn!("{} failed, continuing silently: {}", what, err);
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::engine::TimerState::{Idle, Paused, Running};

    #[test]
    fn test_silent_above_cue_window() {
        let mut tracker = CueTracker::new();
        assert_eq!(tracker.decide(600, Running), CueAction::NoAction);
        assert_eq!(tracker.decide(11, Running), CueAction::NoAction);
    }

    #[test]
    fn test_idle_is_silent() {
        let mut tracker = CueTracker::new();
        assert_eq!(tracker.decide(600, Idle), CueAction::NoAction);
        assert_eq!(tracker.decide(0, Idle), CueAction::NoAction);
    }

    #[test]
    fn test_countdown_cue_seeks_once_per_second() {
        let mut tracker = CueTracker::new();
        assert_eq!(
            tracker.decide(10, Running),
            CueAction::PlayCountdown { offset: 0 }
        );
        // redundant re-evaluation of the same second stays quiet
        assert_eq!(tracker.decide(10, Running), CueAction::NoAction);
        assert_eq!(
            tracker.decide(9, Running),
            CueAction::PlayCountdown { offset: 1 }
        );
        assert_eq!(
            tracker.decide(3, Running),
            CueAction::PlayCountdown { offset: 7 }
        );
    }

    #[test]
    fn test_pause_then_resume_without_reseek() {
        let mut tracker = CueTracker::new();
        tracker.decide(10, Running);
        assert_eq!(tracker.decide(10, Paused), CueAction::PauseCountdown);
        assert_eq!(tracker.decide(10, Paused), CueAction::NoAction);
        assert_eq!(tracker.decide(10, Running), CueAction::ResumeCountdown);
        assert_eq!(tracker.decide(10, Running), CueAction::NoAction);
    }

    #[test]
    fn test_pause_outside_window_is_silent() {
        let mut tracker = CueTracker::new();
        assert_eq!(tracker.decide(120, Paused), CueAction::NoAction);
    }

    #[test]
    fn test_end_cue_fires_exactly_once() {
        let mut tracker = CueTracker::new();
        for remaining in [3u64, 2, 1] {
            assert!(matches!(
                tracker.decide(remaining, Running),
                CueAction::PlayCountdown { .. }
            ));
        }
        assert_eq!(tracker.decide(0, Running), CueAction::PlayEndCue);
        // repeated re-evaluations at zero never replay the alert
        assert_eq!(tracker.decide(0, Running), CueAction::NoAction);
        assert_eq!(tracker.decide(0, Running), CueAction::NoAction);
    }

    #[test]
    fn test_end_cue_rearms_for_a_new_run() {
        let mut tracker = CueTracker::new();
        tracker.decide(1, Running);
        assert_eq!(tracker.decide(0, Running), CueAction::PlayEndCue);
        // a fresh session climbing back above zero rearms the alert
        assert_eq!(tracker.decide(600, Running), CueAction::NoAction);
        tracker.decide(1, Running);
        assert_eq!(tracker.decide(0, Running), CueAction::PlayEndCue);
    }

    #[test]
    fn test_reset_forgets_beeped_second() {
        let mut tracker = CueTracker::new();
        tracker.decide(5, Running);
        tracker.reset();
        assert_eq!(
            tracker.decide(5, Running),
            CueAction::PlayCountdown { offset: 5 }
        );
    }

    #[test]
    fn test_controller_applies_decisions_to_sink() {
        let sink = test_support::RecordingSink::new();
        let mut controller = AudioCueController::new(Box::new(sink.clone()));
        controller.observe(10, Running);
        controller.observe(10, Paused);
        controller.observe(10, Running);
        controller.observe(0, Running);
        controller.reset();
        assert_eq!(sink.calls(), vec!["play@0", "pause", "resume", "end", "stop"]);
    }
}
