//! Refresh timing utilities
//!
//! Pure functions that can be tested without a clock-driven loop.

use chrono::{DateTime, Utc};

/// Check whether the polling interval has elapsed since the last refresh.
///
/// # Arguments
/// * `last_refresh_at` - When the last refresh completed (None if never refreshed)
/// * `interval_secs` - Seconds between refreshes
///
/// # Returns
/// `true` if a refresh is due (or there never was one), `false` otherwise
pub fn refresh_due(last_refresh_at: Option<DateTime<Utc>>, interval_secs: u64) -> bool {
    match last_refresh_at {
        Some(last) => {
            let elapsed = Utc::now() - last;
            elapsed.num_seconds() >= interval_secs as i64
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_never_refreshed() {
        assert!(refresh_due(None, 30));
        assert!(refresh_due(None, 0));
    }

    #[test]
    fn test_recent_refresh() {
        let last = Utc::now() - Duration::seconds(10);
        assert!(!refresh_due(Some(last), 30));
    }

    #[test]
    fn test_old_refresh() {
        let last = Utc::now() - Duration::seconds(60);
        assert!(refresh_due(Some(last), 30));

        let last = Utc::now() - Duration::seconds(30);
        assert!(refresh_due(Some(last), 30));
    }

    #[test]
    fn test_zero_interval() {
        assert!(refresh_due(Some(Utc::now()), 0));
    }
}
