//! Rate limiting for the Twitter API.
//!
//! Twitter enforces per-endpoint limits in fixed 15-minute windows and
//! reports the live state both through a bulk status endpoint and through
//! `x-rate-limit-*` response headers. This module mirrors those windows
//! locally so callers can fail fast instead of burning calls on guaranteed
//! 429s.
//!
//! ## Accounting model
//!
//! - One [`RateLimitWindow`] per (resource, method) pair, populated from the
//!   bulk status endpoint at client initialization.
//! - Stored state is only ever overwritten from remote hints: response
//!   headers after every call, or a forced zero when the remote API itself
//!   rejects a call for rate limiting.
//! - [`Margins`] are applied at read time only, never to stored state: a
//!   count margin keeps a few calls in reserve, a time margin pads the
//!   reported reset so clock skew cannot make a window look open early.
//!
//! ## Example
//!
//! ```rust,ignore
//! use twitter_api_client::rate_limit::{Margins, RateLimitTracker, Resource};
//!
//! let status = client.rate_limit_status(&Resource::ALL).await?;
//! let tracker = RateLimitTracker::from_status(&status, Margins::new(3, 2));
//!
//! if tracker.check_allowed(Resource::Statuses, "user_timeline")? {
//!     // safe to issue the call
//! }
//! ```

mod clock;
mod tracker;

pub use clock::{Clock, SystemClock};
pub use tracker::{RateLimitTracker, RateLimitWindow, Resource, WindowStatus};

/// Safety margins applied when reporting rate-limit state to callers.
///
/// Margins never mutate the stored windows; they only shade what callers
/// see so that accounting drift cannot push a process over the real limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    /// Seconds added to the reported reset time.
    pub time_margin: u64,
    /// Calls reserved unused near the limit, subtracted from the reported
    /// remaining count.
    pub count_margin: u32,
}

impl Margins {
    /// Create a new margin pair.
    pub const fn new(time_margin: u64, count_margin: u32) -> Self {
        Self {
            time_margin,
            count_margin,
        }
    }
}
