//! Bounded-concurrency request dispatch with timed retry.
//!
//! [`RequestManager`] queues submitted requests, keeps at most a configured
//! number in flight, and sweeps the in-flight set on a fixed interval:
//! requests that have neither completed nor been abandoned within the resend
//! interval are dispatched again, up to a maximum send count.
//!
//! The retry policy is purely count-and-time. Responses with an error status
//! are not retried immediately - they stay in flight until the next sweep
//! decides to resend or abandon them. Promotion order is LIFO: the most
//! recently submitted request fills a freed slot first.
//!
//! The manager is independent of the rate-limited REST client; it works for
//! any request shape a [`Transport`] can deliver.
//!
//! ## Example
//!
//! ```rust,no_run
//! use twitter_api_client::dispatch::{
//!     DispatchConfig, DispatchRequest, HttpTransport, RequestManager,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RequestManager::spawn(
//!         HttpTransport::new(),
//!         DispatchConfig::new(4),
//!         |request, response| {
//!             println!("{} -> {}", request.url, response.status);
//!         },
//!     );
//!
//!     manager.submit(DispatchRequest::new("https://example.com/callback"));
//! }
//! ```

mod http;
mod manager;

pub use http::HttpTransport;
pub use manager::{
    DEFAULT_MAX_SENDS, DEFAULT_RESEND_INTERVAL, DEFAULT_SWEEP_INTERVAL, DispatchConfig,
    DispatchRequest, DispatchSnapshot, RequestId, RequestManager, Transport, TransportResponse,
};
