//! Shared fixtures for tool tests.

use std::sync::Arc;

use async_trait::async_trait;
use feedline_client::{EngineConfig, FeedEngine, FeedQuery, FeedSource, UpstreamPage};
use feedline_core::{CacheDb, Error, FeedCache};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

/// Upstream stand-in with a fixed answer.
pub struct StaticSource {
    ids: Vec<String>,
    fail_status: Option<u16>,
}

impl StaticSource {
    pub fn new(ids: &[&str]) -> Self {
        Self { ids: ids.iter().map(|id| id.to_string()).collect(), fail_status: None }
    }

    pub fn failing(status: u16) -> Self {
        Self { ids: Vec::new(), fail_status: Some(status) }
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, _query: &FeedQuery) -> Result<UpstreamPage, Error> {
        match self.fail_status {
            Some(status) => Err(Error::UpstreamStatus(status)),
            None => Ok(UpstreamPage { post_ids: self.ids.clone(), cursor: None }),
        }
    }
}

pub async fn engine(source: StaticSource) -> FeedEngine<StaticSource> {
    let store = CacheDb::open_in_memory().await.unwrap();
    FeedEngine::new(Arc::new(source), FeedCache::new(Arc::new(store)), EngineConfig::default())
}

/// Decode the JSON text content of a tool result.
pub fn output_of<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
