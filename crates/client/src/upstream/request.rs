//! Recommendation service request types and validation.

use feedline_core::{FeedCacheKey, FeedFilters};
use serde::Serialize;

use super::UpstreamError;

/// Feed id sent upstream for unscoped requests.
pub const GLOBAL_FEED_ID: &str = "global";

/// Query parameters of one upstream feed request.
///
/// Filter lists are sent comma-joined and only when non-empty; the HTTP
/// client URL-encodes every value.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct FeedRequest {
    /// Number of ranked ids to return.
    pub page_size: usize,

    /// How many of those should be recency-biased, `ceil(page_size / 3)`.
    pub fresh_page_size: usize,

    pub feed_version: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// The feed id, or `global` for unscoped feeds.
    pub feed_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tags: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_tags: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_sources: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squad_ids: Option<String>,
}

/// Size of the recency-biased share of a page.
pub fn fresh_page_size(page_size: usize) -> usize {
    page_size.div_ceil(3)
}

fn csv(list: Option<&Vec<String>>) -> Option<String> {
    list.filter(|values| !values.is_empty()).map(|values| values.join(","))
}

impl FeedRequest {
    /// Build an unfiltered request for the feed and viewer of `key`.
    pub fn new(key: &FeedCacheKey, page_size: usize, feed_version: u32) -> Self {
        Self {
            page_size,
            fresh_page_size: fresh_page_size(page_size),
            feed_version,
            user_id: key.viewer.id().map(str::to_string),
            feed_id: key.feed.id().unwrap_or(GLOBAL_FEED_ID).to_string(),
            ..Default::default()
        }
    }

    /// Attach resolved filters.
    ///
    /// `exclude_types` has no upstream parameter and is not sent.
    pub fn with_filters(mut self, filters: &FeedFilters) -> Self {
        self.allowed_tags = csv(filters.include_tags.as_ref());
        self.blocked_tags = csv(filters.blocked_tags.as_ref());
        self.blocked_sources = csv(filters.exclude_sources.as_ref());
        self.squad_ids = csv(filters.source_ids.as_ref());
        self
    }

    /// Validate the request parameters.
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.page_size == 0 {
            return Err(UpstreamError::InvalidRequest("page_size must be greater than 0".into()));
        }
        if self.feed_id.is_empty() {
            return Err(UpstreamError::InvalidRequest("feed_id cannot be empty".into()));
        }
        Ok(())
    }
}
