//! cache_inspect tool implementation.
//!
//! Retrieves the cached ranked list of one feed and viewer.

use feedline_core::{CachedFeed, Error, FeedCache, FeedCacheKey};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_inspect tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectParams {
    /// Viewer of the entry. Omit for the anonymous bucket.
    #[serde(default)]
    pub viewer_id: Option<String>,

    /// Feed of the entry. Omit for the global feed.
    #[serde(default)]
    pub feed_id: Option<String>,
}

/// Output from the cache_inspect tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectOutput {
    /// The cached entry.
    pub entry: CachedFeed,
}

/// Implementation of the cache_inspect tool.
pub async fn inspect_impl(cache: &FeedCache, params: CacheInspectParams) -> Result<CallToolResult, McpError> {
    let key = FeedCacheKey::for_ids(params.viewer_id.as_deref(), params.feed_id.as_deref());
    let entry = cache
        .inspect(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheInspectOutput { entry };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
