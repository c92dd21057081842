use chrono::Utc;

/// Current unix time in seconds, as compared against order expiries.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
