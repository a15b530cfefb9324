//! Twitter REST API endpoint constants.

/// Base URL for the Twitter REST API.
pub const TWITTER_BASE_URL: &str = "https://api.twitter.com";

/// Get tweets from a user's timeline.
pub const USER_TIMELINE: &str = "/1.1/statuses/user_timeline.json";
/// Get follower ids for a user.
pub const FOLLOWER_IDS: &str = "/1.1/followers/ids.json";
/// Bulk user lookup.
pub const LOOKUP_USERS: &str = "/1.1/users/lookup.json";
/// Get a single user.
pub const SHOW_USER: &str = "/1.1/users/show.json";
/// Search recent tweets.
pub const SEARCH_TWEETS: &str = "/1.1/search/tweets.json";
/// Bulk rate-limit status for a set of resource categories.
pub const RATE_LIMIT_STATUS: &str = "/1.1/application/rate_limit_status.json";
