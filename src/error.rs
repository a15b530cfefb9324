//! Error types for the Twitter client library.

use reqwest::StatusCode;
use thiserror::Error;

use crate::rate_limit::Resource;

/// Synthetic status code reported when a call failed before producing a real
/// HTTP response (transport failure, unparseable payload).
pub const GENERIC_FAILURE_CODE: u16 = 599;

/// The [`StatusCode`] form of [`GENERIC_FAILURE_CODE`].
pub fn generic_failure_status() -> StatusCode {
    StatusCode::from_u16(GENERIC_FAILURE_CODE).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The main error type for all Twitter client operations.
///
/// Quota exhaustion is *not* an error: throttled calls return a normal
/// [`CallOutcome`](crate::rest::CallOutcome) carrying status 429. This enum
/// covers programming errors and failures of the client machinery itself.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query string encoding error
    #[error("query encoding error: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// A rate-limit window was queried for a (resource, method) pair that was
    /// never populated from the bulk status endpoint. Callers must only query
    /// windows that are actually tracked.
    #[error("no rate-limit window tracked for {resource}/{method}")]
    UntrackedWindow {
        /// Resource category of the missing window
        resource: Resource,
        /// Method name of the missing window
        method: String,
    },

    /// Invalid response from the API
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Missing required credentials
    #[error("missing credentials: a bearer token is required")]
    MissingCredentials,
}

/// An error returned by the Twitter API in the response body.
///
/// Twitter reports errors as `{"errors": [{"code": 88, "message": "..."}]}`;
/// the numeric code identifies the failure independent of the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Twitter's numeric error code (e.g. 88 for "Rate limit exceeded")
    pub code: u32,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Parse the first API error out of a Twitter error response body.
    ///
    /// Returns `None` if the body is not Twitter's error envelope or the
    /// `errors` array is empty.
    pub fn from_body(body: &str) -> Option<Self> {
        let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
        envelope.errors.into_iter().next()
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == error_codes::RATE_LIMIT_EXCEEDED
    }

    /// Check if this is an authentication or token error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.code,
            error_codes::COULD_NOT_AUTHENTICATE
                | error_codes::INVALID_OR_EXPIRED_TOKEN
                | error_codes::BAD_AUTHENTICATION_DATA
        )
    }

    /// Check if this error refers to a missing user or page.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            error_codes::PAGE_DOES_NOT_EXIST | error_codes::USER_NOT_FOUND
        )
    }

    /// Check if the service reported itself over capacity.
    pub fn is_over_capacity(&self) -> bool {
        self.code == error_codes::OVER_CAPACITY
    }
}

/// Twitter's error response envelope.
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

impl<'de> serde::Deserialize<'de> for ApiError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Entry {
            code: u32,
            message: String,
        }
        let entry = Entry::deserialize(deserializer)?;
        Ok(ApiError::new(entry.code, entry.message))
    }
}

/// Known Twitter error codes for pattern matching.
pub mod error_codes {
    /// Could not authenticate you
    pub const COULD_NOT_AUTHENTICATE: u32 = 32;
    /// Sorry, that page does not exist
    pub const PAGE_DOES_NOT_EXIST: u32 = 34;
    /// User not found
    pub const USER_NOT_FOUND: u32 = 50;
    /// Rate limit exceeded
    pub const RATE_LIMIT_EXCEEDED: u32 = 88;
    /// Invalid or expired token
    pub const INVALID_OR_EXPIRED_TOKEN: u32 = 89;
    /// Over capacity
    pub const OVER_CAPACITY: u32 = 130;
    /// Internal error
    pub const INTERNAL_ERROR: u32 = 131;
    /// Bad authentication data
    pub const BAD_AUTHENTICATION_DATA: u32 = 215;
}
