//! Time display formatting
//!
//! Pure helpers shared by the engine and the HTTP surface. Keypad input is
//! treated as a literal `HHMMSS` digit string: fields are never normalized,
//! so "75" minutes displays as 75 and commits as 75 * 60 seconds.

/// Number of digits a pending keypad entry is padded to
pub const PENDING_WIDTH: usize = 6;

/// Format a second count as "HH:MM:SS"
///
/// Hours widen past two digits above 99 hours rather than wrapping.
pub fn format_elapsed(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a pending keypad entry (0-6 ASCII digits) as "HH:MM:SS"
pub fn format_pending(digits: &str) -> String {
    let padded = format!("{:0>width$}", digits, width = PENDING_WIDTH);
    format!("{}:{}:{}", &padded[0..2], &padded[2..4], &padded[4..6])
}

/// Parse a pending keypad entry into a second count
///
/// Each two-digit field is taken literally, no bounds check on minutes or
/// seconds.
pub fn pending_seconds(digits: &str) -> u64 {
    let padded = format!("{:0>width$}", digits, width = PENDING_WIDTH);
    let hours = field_value(&padded[0..2]);
    let minutes = field_value(&padded[2..4]);
    let seconds = field_value(&padded[4..6]);
    hours * 3600 + minutes * 60 + seconds
}

fn field_value(field: &str) -> u64 {
    field
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0, |acc, d| acc * 10 + d as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(61), "00:01:01");
        assert_eq!(format_elapsed(600), "00:10:00");
        assert_eq!(format_elapsed(3661), "01:01:01");
        assert_eq!(format_elapsed(359_999), "99:59:59");
    }

    #[test]
    fn test_format_elapsed_widens_past_99_hours() {
        assert_eq!(format_elapsed(360_030), "100:00:30");
    }

    #[test]
    fn test_format_elapsed_field_arithmetic() {
        for n in [0u64, 1, 59, 60, 3599, 3600, 86_400, 359_999] {
            let expected = format!("{:02}:{:02}:{:02}", n / 3600, (n % 3600) / 60, n % 60);
            assert_eq!(format_elapsed(n), expected);
        }
    }

    #[test]
    fn test_format_pending_pads_left() {
        assert_eq!(format_pending(""), "00:00:00");
        assert_eq!(format_pending("5"), "00:00:05");
        assert_eq!(format_pending("130"), "00:01:30");
        assert_eq!(format_pending("001000"), "00:10:00");
        assert_eq!(format_pending("123456"), "12:34:56");
    }

    #[test]
    fn test_format_pending_is_literal() {
        // No arithmetic normalization: 99 minutes stays 99 on the display
        assert_eq!(format_pending("9900"), "00:99:00");
        assert_eq!(format_pending("99"), "00:00:99");
    }

    #[test]
    fn test_pending_seconds() {
        assert_eq!(pending_seconds(""), 0);
        assert_eq!(pending_seconds("001000"), 600);
        assert_eq!(pending_seconds("10000"), 3600);
        assert_eq!(pending_seconds("123456"), 12 * 3600 + 34 * 60 + 56);
    }

    #[test]
    fn test_pending_seconds_accepts_overflowed_fields() {
        // 75 minutes commits literally as 75 * 60 seconds
        assert_eq!(pending_seconds("7500"), 75 * 60);
        assert_eq!(pending_seconds("90"), 90);
    }
}
