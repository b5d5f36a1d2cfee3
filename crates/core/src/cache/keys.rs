//! Feed cache key derivation.
//!
//! Keys partition the store by feed and viewer:
//!
//! - `feeds:<feedId|global>:<viewerId|anonymous>:posts` holds the ordered id list
//! - `feeds:<feedId|global>:<viewerId|anonymous>:time` holds the generation timestamp
//! - `feeds:<feedId|global>:update` holds the feed's mutation marker
//!
//! The sentinel scopes are enum variants rather than magic strings, so every
//! caller has to decide explicitly which partition it reads. An id spelled
//! like a sentinel (`global`, `anonymous`) *is* that sentinel, and `:` and `%`
//! inside ids are percent-escaped, so distinct scopes never render the same key.
//! Ids are otherwise used verbatim; only blank ids count as absent.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

const KEY_NAMESPACE: &str = "feeds";
const GLOBAL_FEED: &str = "global";
const ANONYMOUS_VIEWER: &str = "anonymous";

/// Which feed configuration a cached list was ranked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedScope {
    /// The process-wide default feed used for unscoped browsing.
    Global,
    /// A named, configurable feed.
    Feed(String),
}

/// Who a cached list was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerScope {
    Anonymous,
    Viewer(String),
}

impl FeedScope {
    /// Map an optional feed id onto a scope.
    ///
    /// Absent, blank, and literal `global` ids are the global feed.
    pub fn from_id(feed_id: Option<&str>) -> Self {
        match feed_id {
            Some(id) if !id.trim().is_empty() && id != GLOBAL_FEED => FeedScope::Feed(id.to_string()),
            _ => FeedScope::Global,
        }
    }

    /// The feed id, or `None` for the global feed.
    pub fn id(&self) -> Option<&str> {
        match self {
            FeedScope::Global => None,
            FeedScope::Feed(id) => Some(id),
        }
    }

    fn segment(&self) -> Cow<'_, str> {
        self.id().map_or(Cow::Borrowed(GLOBAL_FEED), escape_segment)
    }

    /// `feeds:<feed>`, shared by every viewer of this feed.
    pub fn prefix(&self) -> String {
        format!("{KEY_NAMESPACE}:{}", self.segment())
    }

    /// Key of the mutation marker for this feed.
    pub fn update_key(&self) -> String {
        format!("{}:update", self.prefix())
    }
}

impl ViewerScope {
    /// Map an optional viewer id onto a scope.
    ///
    /// Absent, blank, and literal `anonymous` ids are the anonymous bucket.
    pub fn from_id(viewer_id: Option<&str>) -> Self {
        match viewer_id {
            Some(id) if !id.trim().is_empty() && id != ANONYMOUS_VIEWER => ViewerScope::Viewer(id.to_string()),
            _ => ViewerScope::Anonymous,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ViewerScope::Anonymous => None,
            ViewerScope::Viewer(id) => Some(id),
        }
    }

    fn segment(&self) -> Cow<'_, str> {
        self.id().map_or(Cow::Borrowed(ANONYMOUS_VIEWER), escape_segment)
    }
}

/// Escape the key separator so an id can never span two key segments.
fn escape_segment(id: &str) -> Cow<'_, str> {
    if id.contains([':', '%']) {
        Cow::Owned(id.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(id)
    }
}

/// Composite key of one cached feed list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedCacheKey {
    pub feed: FeedScope,
    pub viewer: ViewerScope,
}

impl FeedCacheKey {
    pub fn new(feed: FeedScope, viewer: ViewerScope) -> Self {
        Self { feed, viewer }
    }

    /// Derive a key from optional viewer and feed ids.
    pub fn for_ids(viewer_id: Option<&str>, feed_id: Option<&str>) -> Self {
        Self::new(FeedScope::from_id(feed_id), ViewerScope::from_id(viewer_id))
    }

    pub fn posts_key(&self) -> String {
        format!("{self}:posts")
    }

    pub fn time_key(&self) -> String {
        format!("{self}:time")
    }

    /// Mutation marker key; depends on the feed portion only.
    pub fn update_key(&self) -> String {
        self.feed.update_key()
    }
}

impl fmt::Display for FeedCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feed.prefix(), self.viewer.segment())
    }
}
