//! Time utilities

use chrono::{DateTime, Utc};

/// Check that a window is well ordered
pub fn is_valid_window(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start < end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_valid_window() {
        let now = Utc::now();
        assert!(is_valid_window(now, now + Duration::hours(1)));
        assert!(!is_valid_window(now, now));
        assert!(!is_valid_window(now + Duration::hours(1), now));
    }
}
