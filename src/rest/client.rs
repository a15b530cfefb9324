//! Twitter REST API client implementation.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    Retryable, RetryableStrategy, RetryTransientMiddleware, default_on_request_failure,
    policies::ExponentialBackoff,
};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use url::Url;

use crate::Result;
use crate::auth::CredentialsProvider;
use crate::error::{ApiError, TwitterError, generic_failure_status};
use crate::rate_limit::{Clock, Margins, RateLimitTracker, Resource, WindowStatus};
use crate::rest::endpoints::{self, TWITTER_BASE_URL};
use crate::rest::operations::{
    FollowerIdsRequest, LookupUsersRequest, Operation, SearchTweetsRequest, ShowUserRequest,
    UserTimelineRequest,
};
use crate::rest::types::{
    CallOutcome, FollowerIds, RateLimitStatus, SearchResults, Tweet, TwitterUser,
};

/// The Twitter REST API client.
///
/// Wraps the tracked REST operations with local rate-limit accounting: every
/// call is checked against the mirrored windows first and short-circuits with
/// a 429 outcome when the quota is exhausted, and every response refreshes
/// the windows from the `x-rate-limit-*` headers.
///
/// # Example
///
/// ```rust,no_run
/// use twitter_api_client::auth::StaticCredentials;
/// use twitter_api_client::rate_limit::Margins;
/// use twitter_api_client::rest::{TwitterClient, UserTimelineRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = TwitterClient::builder()
///         .credentials(StaticCredentials::new("bearer-token"))
///         .margins(Margins::new(3, 2))
///         .connect()
///         .await?;
///
///     let outcome = client
///         .user_timeline(&UserTimelineRequest::by_screen_name("jack"))
///         .await?;
///     if let Some(tweets) = outcome.payload {
///         println!("fetched {} tweets", tweets.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TwitterClient {
    http: ClientWithMiddleware,
    base_url: String,
    credentials: Arc<dyn CredentialsProvider>,
    limits: Arc<Mutex<RateLimitTracker>>,
}

impl TwitterClient {
    /// Create a new client builder.
    pub fn builder() -> TwitterClientBuilder {
        TwitterClientBuilder::new()
    }

    /// Fetch a user's timeline, excluding retweets.
    pub async fn user_timeline(
        &self,
        request: &UserTimelineRequest,
    ) -> Result<CallOutcome<Vec<Tweet>>> {
        info!(
            user_id = ?request.user_id,
            screen_name = ?request.screen_name,
            count = request.count,
            "user_timeline"
        );
        let outcome = self.execute(&Operation::UserTimeline(request.clone())).await?;
        Ok(typed(outcome))
    }

    /// Fetch follower ids for a user.
    pub async fn follower_ids(
        &self,
        request: &FollowerIdsRequest,
    ) -> Result<CallOutcome<FollowerIds>> {
        info!(
            screen_name = %request.screen_name,
            count = request.count,
            "follower_ids"
        );
        let outcome = self.execute(&Operation::FollowerIds(request.clone())).await?;
        Ok(typed(outcome))
    }

    /// Bulk-lookup users by id or screen name.
    pub async fn lookup_users(
        &self,
        request: &LookupUsersRequest,
    ) -> Result<CallOutcome<Vec<TwitterUser>>> {
        info!(
            user_id = ?request.user_id,
            screen_name = ?request.screen_name,
            "lookup_users"
        );
        let outcome = self.execute(&Operation::LookupUsers(request.clone())).await?;
        Ok(typed(outcome))
    }

    /// Fetch a single user.
    pub async fn show_user(&self, request: &ShowUserRequest) -> Result<CallOutcome<TwitterUser>> {
        info!(
            user_id = ?request.user_id,
            screen_name = ?request.screen_name,
            "show_user"
        );
        let outcome = self.execute(&Operation::ShowUser(request.clone())).await?;
        Ok(typed(outcome))
    }

    /// Search recent tweets.
    pub async fn search_tweets(
        &self,
        request: &SearchTweetsRequest,
    ) -> Result<CallOutcome<SearchResults>> {
        info!(query = %request.q, "search_tweets");
        let outcome = self.execute(&Operation::SearchTweets(request.clone())).await?;
        Ok(typed(outcome))
    }

    /// Execute a tracked operation.
    ///
    /// This is the single dispatch path every typed operation funnels
    /// through: check the rate-limit window, issue the request, record the
    /// response headers, map the status. Quota exhaustion and remote errors
    /// come back as outcomes, never as `Err`.
    pub async fn execute(&self, operation: &Operation) -> Result<CallOutcome<Value>> {
        let resource = operation.resource();
        let method = operation.method();

        if !self.limits.lock().await.check_allowed(resource, method)? {
            info!(%resource, method, "window exhausted, throttling locally");
            return Ok(CallOutcome::throttled());
        }

        let query = operation.query()?;
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, operation.path())
        } else {
            format!("{}{}?{}", self.base_url, operation.path(), query)
        };

        let response = match self
            .http
            .get(&url)
            .bearer_auth(self.credentials.bearer_token().expose())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(%resource, method, error = %err, "unexpected error accessing the Twitter API");
                return Ok(CallOutcome::empty(generic_failure_status()));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => Some(body),
            Err(err) => {
                error!(%resource, method, error = %err, "failed reading response body");
                None
            }
        };

        let api_error = match &body {
            Some(body) if !status.is_success() => ApiError::from_body(body),
            _ => None,
        };
        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || api_error.as_ref().is_some_and(ApiError::is_rate_limit);

        {
            let mut limits = self.limits.lock().await;
            if rate_limited {
                limits.record_rate_limit_hit(resource, method)?;
            }
            limits.record_response(resource, method, &headers)?;
        }

        if let Some(error) = &api_error {
            warn!(
                %resource,
                method,
                status = status.as_u16(),
                code = error.code,
                message = %error.message,
                "Twitter API error"
            );
        } else if !status.is_success() {
            warn!(%resource, method, status = status.as_u16(), "Twitter API error");
        }

        let Some(body) = body else {
            return Ok(CallOutcome::empty(generic_failure_status()));
        };
        if !status.is_success() {
            return Ok(CallOutcome::empty(status));
        }

        match serde_json::from_str(&body) {
            Ok(payload) => Ok(CallOutcome {
                status,
                payload: Some(payload),
            }),
            Err(err) => {
                error!(%resource, method, error = %err, "failed parsing response payload");
                Ok(CallOutcome::empty(generic_failure_status()))
            }
        }
    }

    /// Fetch the bulk rate-limit status for a set of resource categories.
    ///
    /// Also used internally at [`connect`](TwitterClientBuilder::connect) to
    /// seed the tracker; a failure here is a hard error, not an outcome.
    pub async fn rate_limit_status(&self, resources: &[Resource]) -> Result<RateLimitStatus> {
        let joined = resources
            .iter()
            .map(Resource::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}{}?resources={}",
            self.base_url,
            endpoints::RATE_LIMIT_STATUS,
            joined
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.bearer_token().expose())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwitterError::InvalidResponse(format!(
                "HTTP {status} from rate limit status: {body}"
            )));
        }
        Ok(response.json().await?)
    }

    /// Re-fetch the bulk status and refresh every tracked window.
    pub async fn refresh_rate_limits(&self) -> Result<()> {
        let status = self.rate_limit_status(&Resource::ALL).await?;
        self.limits.lock().await.refresh_from_status(&status);
        Ok(())
    }

    /// Margin-adjusted state of one rate-limit window.
    ///
    /// Fails with [`TwitterError::UntrackedWindow`] for pairs the bulk status
    /// never reported.
    pub async fn window_status(&self, resource: Resource, method: &str) -> Result<WindowStatus> {
        self.limits.lock().await.status(resource, method)
    }
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Deserialize an outcome's raw payload into its typed shape.
///
/// A payload that does not match is reported as a generic failure, mirroring
/// how other unexpected responses surface.
fn typed<T: serde::de::DeserializeOwned>(outcome: CallOutcome<Value>) -> CallOutcome<T> {
    let CallOutcome { status, payload } = outcome;
    match payload {
        Some(value) => match serde_json::from_value(value) {
            Ok(payload) => CallOutcome {
                status,
                payload: Some(payload),
            },
            Err(err) => {
                error!(error = %err, "response payload did not match the expected shape");
                CallOutcome::empty(generic_failure_status())
            }
        },
        None => CallOutcome::empty(status),
    }
}

/// Builder for [`TwitterClient`].
pub struct TwitterClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    margins: Margins,
    user_agent: Option<String>,
    max_retries: u32,
    clock: Option<Arc<dyn Clock>>,
}

impl TwitterClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: TWITTER_BASE_URL.to_string(),
            credentials: None,
            margins: Margins::default(),
            user_agent: None,
            max_retries: 3,
            clock: None,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: impl CredentialsProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Set the safety margins applied when reporting rate-limit state.
    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient transport failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Inject a clock for the rate-limit tracker (used by tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client and seed its rate-limit windows from the bulk status
    /// endpoint.
    pub async fn connect(self) -> Result<TwitterClient> {
        let credentials = self.credentials.ok_or(TwitterError::MissingCredentials)?;
        Url::parse(&self.base_url)?;

        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("twitter-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("twitter-api-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
        let http = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                RetryTransportFailures,
            ))
            .build();

        let tracker = match self.clock {
            Some(clock) => RateLimitTracker::with_clock(self.margins, clock),
            None => RateLimitTracker::new(self.margins),
        };

        let client = TwitterClient {
            http,
            base_url: self.base_url,
            credentials,
            limits: Arc::new(Mutex::new(tracker)),
        };
        client.refresh_rate_limits().await?;
        Ok(client)
    }
}

impl Default for TwitterClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry strategy for the transport middleware.
///
/// Only failures that never produced an HTTP response are retried. Status
/// codes - 429s and 5xxs included - belong to the rate-limit accounting and
/// pass-through contract, so they are never retried here.
struct RetryTransportFailures;

impl RetryableStrategy for RetryTransportFailures {
    fn handle(
        &self,
        result: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match result {
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}
