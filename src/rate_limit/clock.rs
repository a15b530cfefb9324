//! Clock abstraction for rate-limit accounting.
//!
//! Window resets are epoch timestamps from the remote API, so the tracker
//! compares against wall-clock time. Injecting the clock lets tests simulate
//! elapsed time instead of sleeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time as seconds since the Unix epoch.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time in epoch seconds.
    fn epoch_secs(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }
}
