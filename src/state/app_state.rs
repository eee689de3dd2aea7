//! Main application state management

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::audio::AudioCueController;
use crate::audio::CueSink;
use crate::format;

use super::engine::{CountdownEngine, TimerSnapshot, TimerState};
use super::input::DigitBuffer;

/// Observable widget state handed to the presentation shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetView {
    pub display: String,
    pub button_label: String,
    pub primary_action_disabled: bool,
    pub near_end_warning: bool,
    pub state: TimerState,
    pub remaining_seconds: u64,
    pub pending_input: String,
}

/// Result of applying one inbound intent
#[derive(Debug, Clone)]
pub struct IntentOutcome {
    /// False when the intent was silently rejected in the current state
    pub applied: bool,
    pub view: WidgetView,
}

/// Countdown engine and keypad buffer guarded together, so gating decisions
/// and cross-component side effects see one consistent session
struct WidgetSession {
    engine: CountdownEngine,
    input: DigitBuffer,
}

impl WidgetSession {
    fn view(&self) -> WidgetView {
        let pending_empty = self.input.is_empty();
        let display = if self.engine.state() == TimerState::Idle && !pending_empty {
            format::format_pending(self.input.as_str())
        } else {
            format::format_elapsed(self.engine.remaining_seconds())
        };
        WidgetView {
            display,
            button_label: self.engine.button_label().to_string(),
            primary_action_disabled: self.engine.primary_action_disabled(pending_empty),
            near_end_warning: self.engine.near_end(),
            state: self.engine.state(),
            remaining_seconds: self.engine.remaining_seconds(),
            pending_input: self.input.as_str().to_string(),
        }
    }
}

/// Exclusive claim on the one-second tick source, released on drop
///
/// At most one claim is live per `AppState`; the ticker task holds it for
/// exactly as long as the engine is running.
pub struct TickClaim {
    flag: Arc<AtomicBool>,
}

impl Drop for TickClaim {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Main application state that manages the timer session and audio cues
pub struct AppState {
    session: Mutex<WidgetSession>,
    cues: Mutex<AudioCueController>,
    /// Channel publishing a snapshot after every session mutation
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
    tick_claim: Arc<AtomicBool>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last accepted intent tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(port: u16, host: String, configured_seconds: u64, sink: Box<dyn CueSink>) -> Self {
        let engine = CountdownEngine::new(configured_seconds);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        Self {
            session: Mutex::new(WidgetSession {
                engine,
                input: DigitBuffer::new(),
            }),
            cues: Mutex::new(AudioCueController::new(sink)),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
            tick_claim: Arc::new(AtomicBool::new(false)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Apply one mutation to the session, publish the snapshot, and
    /// re-evaluate audio cues
    fn mutate<F>(&self, action: Option<&str>, updater: F) -> Result<IntentOutcome, String>
    where
        F: FnOnce(&mut WidgetSession) -> bool,
    {
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Failed to lock timer session: {}", e))?;

        let applied = updater(&mut session);
        let view = session.view();
        let snapshot = session.engine.snapshot();
        drop(session); // Release the lock early

        if applied {
            if let Some(action) = action {
                self.record_action(action);
            }
        }

        // Notify the tick source and any other snapshot watchers
        if let Err(e) = self.snapshot_tx.send(snapshot) {
            warn!("Failed to send timer snapshot: {}", e);
        }

        self.sync_cues(snapshot);

        Ok(IntentOutcome { applied, view })
    }

    fn sync_cues(&self, snapshot: TimerSnapshot) {
        match self.cues.lock() {
            Ok(mut cues) => cues.observe(snapshot.remaining_seconds, snapshot.state),
            Err(e) => warn!("Failed to lock cue controller: {}", e),
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Press a keypad digit; ignored while the countdown is running or once
    /// the buffer is full
    pub fn press_digit(&self, digit: char) -> Result<IntentOutcome, String> {
        self.mutate(Some("digit"), |session| {
            if session.engine.state() == TimerState::Running {
                debug!("Digit '{}' ignored, timer running", digit);
                return false;
            }
            session.input.press(digit)
        })
    }

    /// Remove the last pending digit; ignored while running
    pub fn delete_digit(&self) -> Result<IntentOutcome, String> {
        self.mutate(Some("delete"), |session| {
            if session.engine.state() == TimerState::Running {
                return false;
            }
            session.input.delete()
        })
    }

    /// Clear pending input, zero the display, and force `Idle`; ignored while
    /// running
    ///
    /// The engine side effect is intentional: clearing input also clears any
    /// previously configured-then-paused session.
    pub fn clear_input(&self) -> Result<IntentOutcome, String> {
        let outcome = self.mutate(Some("clear"), |session| {
            if session.engine.state() == TimerState::Running {
                return false;
            }
            session.input.clear();
            session.engine.clear();
            true
        })?;
        if outcome.applied {
            if let Ok(mut cues) = self.cues.lock() {
                cues.clear_tracker();
            }
        }
        Ok(outcome)
    }

    /// Start, pause, or resume depending on the current state
    pub fn toggle(&self) -> Result<IntentOutcome, String> {
        self.mutate(Some("toggle"), |session| match session.engine.state() {
            TimerState::Idle => {
                let pending = session.input.committed_seconds();
                if session.engine.start(pending) {
                    // Committed input is consumed, the buffer starts fresh
                    session.input.take();
                    true
                } else {
                    debug!("Start ignored, nothing to count down");
                    false
                }
            }
            _ => session.engine.pause_or_resume(),
        })
    }

    /// Reset to `Idle` with the configured duration, clearing pending input
    /// and stopping audio
    pub fn reset(&self) -> Result<IntentOutcome, String> {
        match self.cues.lock() {
            Ok(mut cues) => cues.reset(),
            Err(e) => warn!("Failed to lock cue controller: {}", e),
        }
        self.mutate(Some("reset"), |session| {
            session.engine.reset();
            session.input.clear();
            true
        })
    }

    /// Advance the countdown by one second; called by the owning tick source
    pub(crate) fn tick(&self) -> Result<IntentOutcome, String> {
        self.mutate(None, |session| {
            session.engine.tick();
            true
        })
    }

    /// Get the current observable widget state
    pub fn view(&self) -> Result<WidgetView, String> {
        self.session
            .lock()
            .map(|session| session.view())
            .map_err(|e| format!("Failed to lock timer session: {}", e))
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Claim the tick source; fails if a claim is already live
    pub fn acquire_tick_claim(&self) -> Option<TickClaim> {
        self.tick_claim
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(TickClaim {
            flag: Arc::clone(&self.tick_claim),
        })
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last accepted intent information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::cues::test_support::RecordingSink;
    use crate::audio::SilentCueSink;
    use crate::state::engine::DEFAULT_DURATION_SECS;

    fn silent_state() -> AppState {
        AppState::new(0, "127.0.0.1".to_string(), DEFAULT_DURATION_SECS, Box::new(SilentCueSink))
    }

    fn recording_state() -> (AppState, RecordingSink) {
        let sink = RecordingSink::new();
        let state = AppState::new(
            0,
            "127.0.0.1".to_string(),
            DEFAULT_DURATION_SECS,
            Box::new(sink.clone()),
        );
        (state, sink)
    }

    fn press_all(state: &AppState, digits: &str) {
        for d in digits.chars() {
            state.press_digit(d).expect("press digit");
        }
    }

    #[test]
    fn test_keypad_entry_displays_and_commits() {
        let state = silent_state();
        press_all(&state, "001000");
        let view = state.view().expect("view");
        assert_eq!(view.display, "00:10:00");
        assert_eq!(view.pending_input, "001000");

        let outcome = state.toggle().expect("toggle");
        assert!(outcome.applied);
        assert_eq!(outcome.view.state, TimerState::Running);
        assert_eq!(outcome.view.remaining_seconds, 600);
        assert_eq!(outcome.view.pending_input, "");
        assert_eq!(outcome.view.button_label, "Pause");
    }

    #[test]
    fn test_start_rejected_with_nothing_configured() {
        let state = silent_state();
        state.clear_input().expect("clear");
        let outcome = state.toggle().expect("toggle");
        assert!(!outcome.applied);
        assert_eq!(outcome.view.state, TimerState::Idle);
        assert!(outcome.view.primary_action_disabled);
    }

    #[test]
    fn test_all_zero_input_does_not_start() {
        let state = silent_state();
        press_all(&state, "000000");
        let outcome = state.toggle().expect("toggle");
        assert!(!outcome.applied);
        assert_eq!(outcome.view.state, TimerState::Idle);
    }

    #[test]
    fn test_keypad_locked_while_running() {
        let state = silent_state();
        press_all(&state, "30");
        state.toggle().expect("start");

        assert!(!state.press_digit('5').expect("press").applied);
        assert!(!state.delete_digit().expect("delete").applied);
        assert!(!state.clear_input().expect("clear").applied);
        let view = state.view().expect("view");
        assert_eq!(view.state, TimerState::Running);
        assert_eq!(view.remaining_seconds, 30);
    }

    #[test]
    fn test_keypad_allowed_while_paused() {
        let state = silent_state();
        press_all(&state, "30");
        state.toggle().expect("start");
        state.toggle().expect("pause");

        assert!(state.press_digit('5').expect("press").applied);
        assert!(state.delete_digit().expect("delete").applied);
    }

    #[test]
    fn test_clear_from_paused_zeroes_session() {
        let state = silent_state();
        press_all(&state, "45");
        state.toggle().expect("start");
        state.toggle().expect("pause");

        let outcome = state.clear_input().expect("clear");
        assert!(outcome.applied);
        assert_eq!(outcome.view.state, TimerState::Idle);
        assert_eq!(outcome.view.remaining_seconds, 0);
        assert_eq!(outcome.view.display, "00:00:00");
        assert!(outcome.view.primary_action_disabled);
    }

    #[test]
    fn test_pause_round_trip_preserves_remaining() {
        let state = silent_state();
        press_all(&state, "10");
        state.toggle().expect("start");
        state.tick().expect("tick");

        state.toggle().expect("pause");
        state.toggle().expect("resume");
        let view = state.view().expect("view");
        assert_eq!(view.state, TimerState::Running);
        assert_eq!(view.remaining_seconds, 9);
    }

    #[test]
    fn test_reset_restores_configured_duration() {
        let state = silent_state();
        press_all(&state, "5");
        state.toggle().expect("start");
        state.tick().expect("tick");

        let outcome = state.reset().expect("reset");
        assert_eq!(outcome.view.state, TimerState::Idle);
        assert_eq!(outcome.view.remaining_seconds, DEFAULT_DURATION_SECS);
        assert_eq!(outcome.view.pending_input, "");
        assert_eq!(outcome.view.display, "00:10:00");
    }

    #[test]
    fn test_snapshot_published_on_mutation() {
        let state = silent_state();
        let rx = state.subscribe();
        press_all(&state, "7");
        state.toggle().expect("start");
        let snapshot = *rx.borrow();
        assert_eq!(snapshot.state, TimerState::Running);
        assert_eq!(snapshot.remaining_seconds, 7);
    }

    #[test]
    fn test_tick_claim_is_exclusive() {
        let state = silent_state();
        let claim = state.acquire_tick_claim().expect("first claim");
        assert!(state.acquire_tick_claim().is_none());
        drop(claim);
        assert!(state.acquire_tick_claim().is_some());
    }

    #[test]
    fn test_end_cue_fires_exactly_once_per_run() {
        let (state, sink) = recording_state();
        press_all(&state, "3");
        state.toggle().expect("start");
        for _ in 0..3 {
            state.tick().expect("tick");
        }
        // further ticks at zero re-evaluate the controller without replaying
        state.tick().expect("tick");
        state.tick().expect("tick");

        let ends = sink.calls().iter().filter(|c| *c == "end").count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_pause_resume_audio_without_reseek() {
        let (state, sink) = recording_state();
        press_all(&state, "9");
        state.toggle().expect("start");
        state.toggle().expect("pause");
        state.toggle().expect("resume");

        assert_eq!(sink.calls(), vec!["play@1", "pause", "resume"]);
    }

    #[test]
    fn test_reset_stops_audio() {
        let (state, sink) = recording_state();
        press_all(&state, "5");
        state.toggle().expect("start");
        state.reset().expect("reset");

        assert!(sink.calls().contains(&"stop".to_string()));
    }

    #[test]
    fn test_countdown_cue_follows_each_tick() {
        let (state, sink) = recording_state();
        press_all(&state, "11");
        state.toggle().expect("start");
        state.tick().expect("tick"); // 10
        state.tick().expect("tick"); // 9

        assert_eq!(sink.calls(), vec!["play@0", "play@1"]);
    }

    #[test]
    fn test_last_action_records_accepted_intents() {
        let state = silent_state();
        let (action, time) = state.get_last_action();
        assert!(action.is_none() && time.is_none());

        state.press_digit('1').expect("press");
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("digit"));
        assert!(time.is_some());
    }
}
