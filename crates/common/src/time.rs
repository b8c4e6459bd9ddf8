use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix seconds.
///
/// Inbound chat events carry second-resolution timestamps, so everything that
/// compares against them uses the same unit.
#[must_use]
pub fn unix_now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
