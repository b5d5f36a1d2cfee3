//! feed_page tool implementation.
//!
//! Serves one page of a ranked feed through the cache-fronted engine.

use feedline_client::{FeedEngine, FeedSource, PageRequest, PageSource};
use feedline_core::{AppConfig, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Page defaults and bounds applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub default_feed_version: u32,
}

impl From<&AppConfig> for PageLimits {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_page_size: config.page_size,
            max_page_size: config.max_page_size,
            default_feed_version: config.default_feed_version,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Input parameters for feed_page tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FeedPageParams {
    /// Viewer the feed is ranked for. Omit for anonymous browsing.
    #[serde(default)]
    pub viewer_id: Option<String>,

    /// Feed to read. Omit for the global feed.
    #[serde(default)]
    pub feed_id: Option<String>,

    /// Position of the first item (default: 0). Pages after the first are
    /// served from the list that produced the first page.
    #[serde(default)]
    pub offset: usize,

    /// Number of items to return (default from configuration).
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Ranking version (default from configuration).
    #[serde(default)]
    pub feed_version: Option<u32>,
}

/// Output structure for feed_page tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedPageOutput {
    /// Post ids of the page, in ranked order.
    pub post_ids: Vec<String>,
    /// Upstream continuation token, when upstream served the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// "cache" or "upstream".
    pub source: String,
}

/// Implementation of the feed_page tool.
pub async fn feed_page_impl<S: FeedSource>(
    engine: &FeedEngine<S>, limits: &PageLimits, params: FeedPageParams,
) -> Result<CallToolResult, McpError> {
    let page_size = params.page_size.unwrap_or(limits.default_page_size);
    if page_size == 0 || page_size > limits.max_page_size {
        return Err(Error::InvalidInput(format!("page_size must be between 1 and {}", limits.max_page_size)).into());
    }

    let request = PageRequest::new(
        params.viewer_id.as_deref(),
        params.feed_id.as_deref(),
        params.offset,
        page_size,
        params.feed_version.unwrap_or(limits.default_feed_version),
    );

    let page = engine.get_page(&request).await?;

    let source = match page.source {
        PageSource::Cache => "cache",
        PageSource::Upstream => "upstream",
    };
    let output = FeedPageOutput { post_ids: page.post_ids, cursor: page.cursor, source: source.into() };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
