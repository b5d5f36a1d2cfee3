//! Recommendation service response types and normalization.

use serde::{Deserialize, Serialize};

/// Raw response from the recommendation service.
#[derive(Debug, Deserialize)]
pub struct FeedApiResponse {
    #[serde(default)]
    pub data: Vec<RankedPost>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// One ranked entry. Fields other than the id are ignored.
#[derive(Debug, Deserialize)]
pub struct RankedPost {
    pub post_id: String,
}

/// Normalized upstream result: an ordered list of opaque post ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpstreamPage {
    pub post_ids: Vec<String>,
    /// Continuation token for the transport layer, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl From<FeedApiResponse> for UpstreamPage {
    fn from(raw: FeedApiResponse) -> Self {
        UpstreamPage { post_ids: raw.data.into_iter().map(|post| post.post_id).collect(), cursor: raw.cursor }
    }
}

impl UpstreamPage {
    pub fn is_empty(&self) -> bool {
        self.post_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.post_ids.len()
    }
}
