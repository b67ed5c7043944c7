//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time formatted the way the backend writes `created_at`
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert milliseconds to duration, treating 0 as "use the fallback"
pub fn millis_or(millis: u64, fallback: Duration) -> Duration {
    if millis == 0 {
        fallback
    } else {
        Duration::from_millis(millis)
    }
}
