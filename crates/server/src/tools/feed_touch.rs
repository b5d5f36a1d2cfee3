//! feed_touch tool implementation.
//!
//! Records a configuration change of a feed. Every viewer's next first page
//! of that feed is ranked anew; pages already being scrolled are unaffected.

use feedline_client::{FeedEngine, FeedSource};
use feedline_core::{Error, FeedScope, cache::format_timestamp};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for feed_touch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FeedTouchParams {
    /// Feed whose configuration changed. Omit for the global feed.
    #[serde(default)]
    pub feed_id: Option<String>,
}

/// Output structure for feed_touch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedTouchOutput {
    /// Key of the mutation marker that was written.
    pub key: String,
    /// ISO8601 time recorded in the marker.
    pub updated_at: String,
}

/// Implementation of the feed_touch tool.
pub async fn feed_touch_impl<S: FeedSource>(
    engine: &FeedEngine<S>, params: FeedTouchParams,
) -> Result<CallToolResult, McpError> {
    let feed = FeedScope::from_id(params.feed_id.as_deref());
    let updated_at = engine.mark_feed_updated(&feed).await?;

    let output = FeedTouchOutput { key: feed.update_key(), updated_at: format_timestamp(updated_at) };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{StaticSource, engine, output_of};
    use feedline_core::FeedCacheKey;

    #[tokio::test]
    async fn test_touch_named_feed() {
        let engine = engine(StaticSource::new(&[])).await;

        let result = feed_touch_impl(&engine, FeedTouchParams { feed_id: Some("f1".into()) }).await.unwrap();
        let output: FeedTouchOutput = output_of(&result);

        assert_eq!(output.key, "feeds:f1:update");
        assert!(chrono::DateTime::parse_from_rfc3339(&output.updated_at).is_ok());

        let marks = engine
            .cache()
            .freshness_marks(&FeedCacheKey::for_ids(Some("u9"), Some("f1")))
            .await
            .unwrap();
        assert!(marks.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_touch_defaults_to_global() {
        let engine = engine(StaticSource::new(&[])).await;

        let result = feed_touch_impl(&engine, FeedTouchParams::default()).await.unwrap();
        let output: FeedTouchOutput = output_of(&result);

        assert_eq!(output.key, "feeds:global:update");
    }
}
