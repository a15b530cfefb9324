//! # Twitter Client
//!
//! An async Rust client library for the Twitter REST API with local
//! rate-limit tracking and a bounded-concurrency request dispatcher.
//!
//! ## Features
//!
//! - Local mirrors of the remote rate-limit windows, seeded from the bulk
//!   status endpoint and refreshed from every response's headers
//! - Fail-fast throttling: exhausted windows return a 429 outcome without a
//!   network call
//! - A closed, typed set of tracked operations (timeline, followers, user
//!   lookup, search)
//! - A standalone request manager with a concurrency cap and timed retry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twitter_api_client::auth::StaticCredentials;
//! use twitter_api_client::rate_limit::Margins;
//! use twitter_api_client::rest::{TwitterClient, ShowUserRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TwitterClient::builder()
//!         .credentials(StaticCredentials::new("bearer-token"))
//!         .margins(Margins::new(3, 2))
//!         .connect()
//!         .await?;
//!
//!     let outcome = client
//!         .show_user(&ShowUserRequest::by_screen_name("jack"))
//!         .await?;
//!     println!("status {}: {:?}", outcome.status, outcome.payload);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dispatch;
pub mod error;
pub mod rate_limit;
pub mod rest;

// Re-export commonly used types at crate root
pub use error::TwitterError;
pub use rate_limit::{Margins, RateLimitTracker, Resource};
pub use rest::{CallOutcome, TwitterClient};

/// Result type alias using TwitterError
pub type Result<T> = std::result::Result<T, TwitterError>;
