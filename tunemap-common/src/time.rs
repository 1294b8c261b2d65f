//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Epoch milliseconds for a timestamp
pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Remaining whole seconds until `deadline_ms`, rounded up, floored at zero
pub fn remaining_secs(deadline_ms: i64, now_ms: i64) -> u32 {
    let diff = deadline_ms - now_ms;
    if diff <= 0 {
        0
    } else {
        ((diff + 999) / 1000) as u32
    }
}

/// Format a countdown as `m:ss`
pub fn format_timer(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
