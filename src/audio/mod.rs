//! Audio cue module
//!
//! Decides and executes the countdown-beep and end-alert cues in response to
//! engine state changes. Decision logic is pure; playback goes through the
//! `CueSink` trait so missing audio hardware degrades to silence.

pub mod cues;
pub mod player;

// Re-export main types
pub use cues::{AudioCueController, CueAction, CueSink, CueTracker, SilentCueSink, CUE_WINDOW_SECS};
pub use player::{build_cue_sink, CueTrack, RodioCuePlayer};
