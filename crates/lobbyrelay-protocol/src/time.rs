//! Server-side wall clock.

/// Milliseconds since the Unix epoch, the unit every wire timestamp uses.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
