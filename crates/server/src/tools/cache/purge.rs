//! cache_purge tool implementation.
//!
//! Removes expired entries, and optionally evicts one feed entry outright.

use std::sync::Arc;
use std::time::Duration;

use feedline_core::{Error, FeedCache, FeedCacheKey, KvStore};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Entry to evict regardless of its age.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EvictTarget {
    /// Viewer of the entry. Omit for the anonymous bucket.
    #[serde(default)]
    pub viewer_id: Option<String>,

    /// Feed of the entry. Omit for the global feed.
    #[serde(default)]
    pub feed_id: Option<String>,
}

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Also drop this entry's cached list. Its feed marker is kept.
    #[serde(default)]
    pub evict: Option<EvictTarget>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &FeedCache, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let mut deleted_total = cache.store().purge_expired().await?;

    if let Some(target) = params.evict {
        let key = FeedCacheKey::for_ids(target.viewer_id.as_deref(), target.feed_id.as_deref());
        deleted_total += cache.evict(&key).await?;
    }

    let output = CachePurgeOutput { deleted: deleted_total };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Purge expired entries every `period` until the runtime shuts down.
pub fn spawn_purge_task(store: Arc<dyn KvStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "purged expired cache entries"),
                Err(e) => tracing::warn!(error = %e, "cache purge failed"),
            }
        }
    })
}
