//! Pending keypad input buffer

use crate::format;

/// Maximum number of digits a pending duration can hold (HHMMSS)
pub const MAX_DIGITS: usize = 6;

/// Ordered buffer of ASCII digits entered on the keypad before a countdown
/// starts. Timer-state gating lives in `AppState`, which owns both this
/// buffer and the engine.
#[derive(Debug, Default)]
pub struct DigitBuffer {
    digits: String,
}

impl DigitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a digit, ignored once the buffer is full or for non-digits
    pub fn press(&mut self, digit: char) -> bool {
        if !digit.is_ascii_digit() || self.digits.len() >= MAX_DIGITS {
            return false;
        }
        self.digits.push(digit);
        true
    }

    /// Remove the most recent digit
    pub fn delete(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    /// Drop the buffer contents, releasing the old allocation
    pub fn clear(&mut self) {
        self.digits = String::new();
    }

    /// Consume the buffer on a successful start, leaving it cleared
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.digits)
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Duration the buffer would commit on start, `None` when empty
    pub fn committed_seconds(&self) -> Option<u64> {
        if self.digits.is_empty() {
            None
        } else {
            Some(format::pending_seconds(&self.digits))
        }
    }
}
