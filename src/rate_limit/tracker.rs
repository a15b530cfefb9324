//! Local mirror of the remote API's rate-limit windows.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::error::TwitterError;
use crate::rate_limit::{Clock, Margins, SystemClock};
use crate::rest::RateLimitStatus;
use crate::Result;

/// Response header carrying the calls left in the current window.
pub(crate) const X_RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
/// Response header carrying the epoch second the current window resets.
pub(crate) const X_RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// Rate-limited resource categories tracked by this client.
///
/// These are the top-level keys of the bulk rate-limit status response; each
/// category contains one window per endpoint ("method").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Timeline endpoints (`/statuses/...`).
    Statuses,
    /// Follower graph endpoints (`/followers/...`).
    Followers,
    /// User lookup endpoints (`/users/...`).
    Users,
    /// Tweet search endpoints (`/search/...`).
    Search,
}

impl Resource {
    /// Every resource category the client tracks, in bulk-query order.
    pub const ALL: [Resource; 4] = [
        Resource::Statuses,
        Resource::Followers,
        Resource::Users,
        Resource::Search,
    ];

    /// The category name as it appears in the status response and endpoint
    /// paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Statuses => "statuses",
            Resource::Followers => "followers",
            Resource::Users => "users",
            Resource::Search => "search",
        }
    }

    /// Parse a category name from the bulk status response.
    pub fn parse(name: &str) -> Option<Resource> {
        match name {
            "statuses" => Some(Resource::Statuses),
            "followers" => Some(Resource::Followers),
            "users" => Some(Resource::Users),
            "search" => Some(Resource::Search),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote rate-limit window, keyed by (resource, method).
///
/// `remaining` is stored signed so a forced exhaustion can be reported below
/// zero once the count margin is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// Maximum calls per window.
    pub limit: u32,
    /// Calls left in the current window, per the remote API's last hint.
    pub remaining: i64,
    /// Epoch second the window resets.
    pub reset_at: u64,
}

/// Margin-adjusted, read-only projection of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// Calls left net of the count margin; negative once exhausted.
    pub remaining: i64,
    /// Epoch second the window resets, padded by the time margin.
    pub reset: u64,
    /// Maximum calls per window.
    pub limit: u32,
}

/// Local bookkeeping for the remote API's rate-limit windows.
///
/// Windows are created from the bulk status endpoint, refreshed from the
/// `x-rate-limit-*` headers of every response, and live for the process
/// lifetime. The tracker holds its own window table so independent trackers
/// (and tests) never share state.
#[derive(Debug)]
pub struct RateLimitTracker {
    windows: HashMap<Resource, HashMap<String, RateLimitWindow>>,
    margins: Margins,
    clock: Arc<dyn Clock>,
}

impl RateLimitTracker {
    /// Create an empty tracker using the system clock.
    pub fn new(margins: Margins) -> Self {
        Self::with_clock(margins, Arc::new(SystemClock))
    }

    /// Create an empty tracker with an injected clock.
    pub fn with_clock(margins: Margins, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: HashMap::new(),
            margins,
            clock,
        }
    }

    /// Create a tracker populated from a bulk rate-limit status payload.
    pub fn from_status(status: &RateLimitStatus, margins: Margins) -> Self {
        let mut tracker = Self::new(margins);
        tracker.refresh_from_status(status);
        tracker
    }

    /// Populate or refresh windows from a bulk rate-limit status payload.
    ///
    /// One window is created per (resource, method) pair discovered; the
    /// method name is the second segment of the endpoint key
    /// (`/statuses/user_timeline` -> `user_timeline`). Categories the client
    /// does not track are skipped.
    pub fn refresh_from_status(&mut self, status: &RateLimitStatus) {
        for (name, endpoints) in &status.resources {
            let Some(resource) = Resource::parse(name) else {
                debug!(resource = %name, "skipping untracked resource category");
                continue;
            };
            let table = self.windows.entry(resource).or_default();
            for (endpoint, limits) in endpoints {
                let Some(method) = endpoint.splitn(4, '/').nth(2) else {
                    debug!(%endpoint, "skipping malformed endpoint key");
                    continue;
                };
                table.insert(
                    method.to_string(),
                    RateLimitWindow {
                        limit: limits.limit,
                        remaining: i64::from(limits.remaining),
                        reset_at: limits.reset,
                    },
                );
                debug!(
                    %resource,
                    method,
                    limit = limits.limit,
                    remaining = limits.remaining,
                    "tracking rate-limit window"
                );
            }
        }
    }

    /// Whether a call against this window may be issued right now.
    ///
    /// Returns `Ok(false)` when the window is exhausted; the caller must
    /// report the operation as throttled (429) without touching the network.
    pub fn check_allowed(&self, resource: Resource, method: &str) -> Result<bool> {
        Ok(self.window(resource, method)?.remaining > 0)
    }

    /// Update a window from the rate-limit headers of a response.
    ///
    /// Runs after every call that produced a response, success or error.
    /// Headers the response does not carry leave the stored values untouched.
    pub fn record_response(
        &mut self,
        resource: Resource,
        method: &str,
        headers: &HeaderMap,
    ) -> Result<()> {
        let remaining = header_value(headers, X_RATE_LIMIT_REMAINING);
        let reset = header_value(headers, X_RATE_LIMIT_RESET);

        let now = self.clock.epoch_secs();
        let window = self.window_mut(resource, method)?;
        if let Some(remaining) = remaining {
            window.remaining = remaining;
        }
        if let Some(reset) = reset {
            window.reset_at = reset as u64;
        }

        debug!(
            %resource,
            method,
            remaining = window.remaining,
            reset_in = window.reset_at as i64 - now as i64,
            "window state after call"
        );
        Ok(())
    }

    /// Force a window to exhausted after the remote API rejected a call for
    /// rate limiting.
    ///
    /// Local accounting can lag the remote counter (clock skew, quota shared
    /// across processes), so the remote signal always wins.
    pub fn record_rate_limit_hit(&mut self, resource: Resource, method: &str) -> Result<()> {
        warn!(%resource, method, "remote rate limit hit, forcing window to zero");
        self.window_mut(resource, method)?.remaining = 0;
        Ok(())
    }

    /// Margin-adjusted projection of a window.
    ///
    /// If the stored reset time (plus the time margin) has already passed,
    /// the window reads as refreshed to its full limit without waiting for an
    /// explicit update - lazy rollover. Stored state is never mutated here.
    pub fn status(&self, resource: Resource, method: &str) -> Result<WindowStatus> {
        let window = self.window(resource, method)?;
        let now = self.clock.epoch_secs();

        let remaining = if now > window.reset_at + self.margins.time_margin {
            i64::from(window.limit)
        } else {
            window.remaining
        };

        Ok(WindowStatus {
            remaining: remaining - i64::from(self.margins.count_margin),
            reset: window.reset_at + self.margins.time_margin,
            limit: window.limit,
        })
    }

    /// The margins this tracker reports through.
    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Number of (resource, method) windows currently tracked.
    pub fn window_count(&self) -> usize {
        self.windows.values().map(HashMap::len).sum()
    }

    fn window(&self, resource: Resource, method: &str) -> Result<&RateLimitWindow> {
        self.windows
            .get(&resource)
            .and_then(|table| table.get(method))
            .ok_or_else(|| TwitterError::UntrackedWindow {
                resource,
                method: method.to_string(),
            })
    }

    fn window_mut(&mut self, resource: Resource, method: &str) -> Result<&mut RateLimitWindow> {
        self.windows
            .get_mut(&resource)
            .and_then(|table| table.get_mut(method))
            .ok_or_else(|| TwitterError::UntrackedWindow {
                resource,
                method: method.to_string(),
            })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}
