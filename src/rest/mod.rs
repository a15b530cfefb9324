//! Twitter REST API client.
//!
//! The tracked operation surface is a closed set: each operation is an
//! [`Operation`] variant carrying its own typed parameters, and every call
//! funnels through [`TwitterClient::execute`], which consults the local
//! rate-limit windows before touching the network and refreshes them from
//! the response afterwards.
//!
//! Calls return a [`CallOutcome`] - a (status, payload) pair - rather than
//! an error for throttling or remote failures: status 429 with no payload
//! means the call was short-circuited locally.

mod client;
mod endpoints;
mod operations;
mod types;

pub use client::{TwitterClient, TwitterClientBuilder};
pub use endpoints::*;
pub use operations::{
    FollowerIdsRequest, LookupUsersRequest, Operation, SearchTweetsRequest, ShowUserRequest,
    UserTimelineRequest,
};
pub use types::{
    CallOutcome, EndpointLimit, FollowerIds, RateLimitContext, RateLimitStatus, SearchMetadata,
    SearchResults, Tweet, TwitterUser,
};
