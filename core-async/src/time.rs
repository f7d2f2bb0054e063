//! Time primitives.
//!
//! `timeout` bounds artwork fetches; `sleep` and `Instant` are mostly used by
//! tests that wait for asynchronous engine notifications to settle.

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
pub use tokio::time::{interval, sleep, timeout, Interval, Sleep, Timeout};

/// Error returned when a [`timeout`] elapses.
pub use tokio::time::error::Elapsed;

/// Milliseconds since the Unix epoch, saturating to zero for clocks set
/// before 1970.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
