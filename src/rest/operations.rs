//! The closed set of tracked API operations.
//!
//! Each operation variant carries its own typed parameter struct and knows
//! its endpoint path and rate-limit window, so dispatch is a `match` resolved
//! at compile time rather than a name lookup.

use serde::Serialize;

use crate::rate_limit::Resource;
use crate::rest::endpoints;
use crate::Result;

/// A tracked Twitter API operation with its parameters.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Fetch a user's timeline.
    UserTimeline(UserTimelineRequest),
    /// Fetch follower ids for a user.
    FollowerIds(FollowerIdsRequest),
    /// Bulk-lookup users by id or screen name.
    LookupUsers(LookupUsersRequest),
    /// Fetch a single user.
    ShowUser(ShowUserRequest),
    /// Search recent tweets.
    SearchTweets(SearchTweetsRequest),
}

impl Operation {
    /// The rate-limit resource category this operation draws from.
    pub fn resource(&self) -> Resource {
        match self {
            Operation::UserTimeline(_) => Resource::Statuses,
            Operation::FollowerIds(_) => Resource::Followers,
            Operation::LookupUsers(_) | Operation::ShowUser(_) => Resource::Users,
            Operation::SearchTweets(_) => Resource::Search,
        }
    }

    /// The rate-limit method name within the resource category.
    pub fn method(&self) -> &'static str {
        match self {
            Operation::UserTimeline(_) => "user_timeline",
            Operation::FollowerIds(_) => "ids",
            Operation::LookupUsers(_) => "lookup",
            Operation::ShowUser(_) => "show",
            Operation::SearchTweets(_) => "tweets",
        }
    }

    /// The endpoint path this operation targets.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::UserTimeline(_) => endpoints::USER_TIMELINE,
            Operation::FollowerIds(_) => endpoints::FOLLOWER_IDS,
            Operation::LookupUsers(_) => endpoints::LOOKUP_USERS,
            Operation::ShowUser(_) => endpoints::SHOW_USER,
            Operation::SearchTweets(_) => endpoints::SEARCH_TWEETS,
        }
    }

    /// Encode the operation's parameters as a query string.
    pub fn query(&self) -> Result<String> {
        let query = match self {
            Operation::UserTimeline(request) => serde_urlencoded::to_string(request)?,
            Operation::FollowerIds(request) => serde_urlencoded::to_string(request)?,
            Operation::LookupUsers(request) => serde_urlencoded::to_string(request)?,
            Operation::ShowUser(request) => serde_urlencoded::to_string(request)?,
            Operation::SearchTweets(request) => serde_urlencoded::to_string(request)?,
        };
        Ok(query)
    }
}

/// Parameters for [`Operation::UserTimeline`].
///
/// Targets a user by id or screen name; retweets are excluded to match the
/// tracked timeline semantics.
#[derive(Debug, Clone, Serialize)]
pub struct UserTimelineRequest {
    /// Target user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Target screen name, used when no id is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    /// Page size (default 200, the endpoint maximum).
    pub count: u32,
    /// Whether retweets are included.
    pub include_rts: bool,
    /// Only return tweets with an id at or below this value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id: Option<u64>,
}

impl UserTimelineRequest {
    /// Timeline of the user with this id.
    pub fn by_user_id(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            screen_name: None,
            count: 200,
            include_rts: false,
            max_id: None,
        }
    }

    /// Timeline of the user with this screen name.
    pub fn by_screen_name(screen_name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            screen_name: Some(screen_name.into()),
            count: 200,
            include_rts: false,
            max_id: None,
        }
    }

    /// Set the page size.
    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Page backwards from this tweet id.
    pub fn max_id(mut self, max_id: u64) -> Self {
        self.max_id = Some(max_id);
        self
    }
}

/// Parameters for [`Operation::FollowerIds`].
#[derive(Debug, Clone, Serialize)]
pub struct FollowerIdsRequest {
    /// Screen name of the account whose followers to list.
    pub screen_name: String,
    /// Page size.
    pub count: u32,
    /// Pagination cursor from a previous response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<i64>,
}

impl FollowerIdsRequest {
    /// Followers of the account with this screen name.
    pub fn new(screen_name: impl Into<String>, count: u32) -> Self {
        Self {
            screen_name: screen_name.into(),
            count,
            cursor: None,
        }
    }

    /// Continue from a pagination cursor.
    pub fn cursor(mut self, cursor: i64) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Parameters for [`Operation::LookupUsers`].
///
/// The endpoint takes up to 100 users per call, comma-joined.
#[derive(Debug, Clone, Serialize)]
pub struct LookupUsersRequest {
    /// Comma-joined user ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Comma-joined screen names, used when no ids are given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
}

impl LookupUsersRequest {
    /// Look up users by id.
    pub fn by_ids<I>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self {
            user_id: Some(join_ids(user_ids)),
            screen_name: None,
        }
    }

    /// Look up users by screen name.
    pub fn by_screen_names<I, S>(screen_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = screen_names
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            user_id: None,
            screen_name: Some(joined),
        }
    }
}

/// Parameters for [`Operation::ShowUser`].
#[derive(Debug, Clone, Serialize)]
pub struct ShowUserRequest {
    /// Target user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Target screen name, used when no id is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
}

impl ShowUserRequest {
    /// The user with this id.
    pub fn by_user_id(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            screen_name: None,
        }
    }

    /// The user with this screen name.
    pub fn by_screen_name(screen_name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            screen_name: Some(screen_name.into()),
        }
    }
}

/// Parameters for [`Operation::SearchTweets`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchTweetsRequest {
    /// Search query.
    pub q: String,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Only return tweets with an id at or below this value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id: Option<u64>,
    /// "recent", "popular" or "mixed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
}

impl SearchTweetsRequest {
    /// Search for tweets matching a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            q: query.into(),
            count: None,
            max_id: None,
            result_type: None,
        }
    }

    /// Set the page size.
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Restrict the result type.
    pub fn result_type(mut self, result_type: impl Into<String>) -> Self {
        self.result_type = Some(result_type.into());
        self
    }
}

fn join_ids<I>(ids: I) -> String
where
    I: IntoIterator<Item = u64>,
{
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
