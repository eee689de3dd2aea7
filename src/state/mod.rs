//! State management module
//!
//! This module contains the countdown engine, the keypad input buffer, and
//! the application state that ties them together.

pub mod engine;
pub mod input;
pub mod app_state;

// Re-export main types
pub use engine::{CountdownEngine, TimerSnapshot, TimerState};
pub use input::DigitBuffer;
pub use app_state::{AppState, IntentOutcome, TickClaim, WidgetView};
