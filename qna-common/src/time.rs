//! Timestamp utilities
//!
//! All message and virtual-clock arithmetic in this workspace is done on
//! epoch milliseconds (`u64`). The virtual clock is a server wall-clock
//! timestamp embedded in the stream, so it shares the epoch with message
//! creation times.

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current wall-clock time as epoch milliseconds
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// True when `a` and `b` are within `window_ms` of each other
pub fn within_window(a: u64, b: u64, window_ms: u64) -> bool {
    a.abs_diff(b) <= window_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_now_ms_matches_now() {
        let ms = now_ms();
        let ts = now().timestamp_millis() as u64;
        assert!(ts.abs_diff(ms) < 1000);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_within_window_symmetric() {
        assert!(within_window(1000, 1500, 500));
        assert!(within_window(1500, 1000, 500));
        assert!(!within_window(1000, 1501, 500));
        assert!(!within_window(1501, 1000, 500));
    }

    #[test]
    fn test_within_window_zero_window() {
        assert!(within_window(42, 42, 0));
        assert!(!within_window(42, 43, 0));
    }
}
