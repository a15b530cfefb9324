//! Response types for the tracked Twitter REST operations.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::Deserialize;

/// The result of one tracked API call: the effective status code plus the
/// parsed payload when the call succeeded.
///
/// Every outcome is a normal return value, never an error: 429 with no
/// payload means the call was throttled locally before touching the network,
/// remote statuses pass through unchanged, and
/// [`GENERIC_FAILURE_CODE`](crate::error::GENERIC_FAILURE_CODE) stands in
/// for failures that never produced a real response.
#[derive(Debug, Clone)]
pub struct CallOutcome<T> {
    /// Effective HTTP status of the call.
    pub status: StatusCode,
    /// Parsed payload; present only for successful responses.
    pub payload: Option<T>,
}

impl<T> CallOutcome<T> {
    /// Outcome of a call short-circuited by local rate limiting.
    pub(crate) fn throttled() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            payload: None,
        }
    }

    /// Outcome carrying a status but no payload.
    pub(crate) fn empty(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// Whether the remote call succeeded (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the call was rejected for rate limiting, locally or remotely.
    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Consume the outcome, keeping only the payload.
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

/// A tweet as returned by timeline and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    /// Tweet id.
    pub id: u64,
    /// Tweet id as a string (ids overflow some JSON consumers).
    #[serde(default)]
    pub id_str: Option<String>,
    /// Tweet text.
    pub text: String,
    /// Creation time in Twitter's `created_at` format.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Author, when the endpoint embeds it.
    #[serde(default)]
    pub user: Option<TwitterUser>,
    /// Retweet count.
    #[serde(default)]
    pub retweet_count: u32,
    /// Favorite count.
    #[serde(default)]
    pub favorite_count: u32,
    /// BCP 47 language hint.
    #[serde(default)]
    pub lang: Option<String>,
}

/// A Twitter user.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    /// User id.
    pub id: u64,
    /// User id as a string.
    #[serde(default)]
    pub id_str: Option<String>,
    /// Handle, without the leading `@`.
    pub screen_name: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Profile location.
    #[serde(default)]
    pub location: Option<String>,
    /// Profile description.
    #[serde(default)]
    pub description: Option<String>,
    /// Follower count.
    #[serde(default)]
    pub followers_count: u32,
    /// Following count.
    #[serde(default)]
    pub friends_count: u32,
    /// Tweet count.
    #[serde(default)]
    pub statuses_count: u32,
    /// Whether the account is protected.
    #[serde(default)]
    pub protected: bool,
    /// Whether the account is verified.
    #[serde(default)]
    pub verified: bool,
}

/// Follower ids with pagination cursors.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowerIds {
    /// Follower user ids.
    pub ids: Vec<u64>,
    /// Cursor for the next page; 0 when exhausted.
    #[serde(default)]
    pub next_cursor: i64,
    /// Cursor for the previous page; 0 at the start.
    #[serde(default)]
    pub previous_cursor: i64,
}

/// Search results: matching tweets plus query metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    /// Matching tweets.
    pub statuses: Vec<Tweet>,
    /// Metadata about the executed query.
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
}

/// Metadata block of a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMetadata {
    /// Query execution time in seconds.
    #[serde(default)]
    pub completed_in: Option<f64>,
    /// Highest tweet id in the result page.
    #[serde(default)]
    pub max_id: u64,
    /// Query string for the next page, if any.
    #[serde(default)]
    pub next_results: Option<String>,
    /// The query as executed.
    #[serde(default)]
    pub query: Option<String>,
    /// Requested page size.
    #[serde(default)]
    pub count: u32,
}

/// Bulk rate-limit status response.
///
/// Keys of `resources` are category names ("statuses", ...); inner keys are
/// endpoint paths ("/statuses/user_timeline").
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitStatus {
    /// The authentication context the limits apply to.
    #[serde(default)]
    pub rate_limit_context: Option<RateLimitContext>,
    /// Window state per resource category, keyed by endpoint path.
    pub resources: HashMap<String, HashMap<String, EndpointLimit>>,
}

/// Authentication context of a rate-limit status response.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitContext {
    /// Access token the limits are scoped to.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Window state for a single endpoint in the bulk status response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EndpointLimit {
    /// Maximum calls per window.
    pub limit: u32,
    /// Calls left in the current window.
    pub remaining: u32,
    /// Epoch second the window resets.
    pub reset: u64,
}
