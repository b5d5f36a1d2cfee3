//! Read orchestration for paginated feeds.
//!
//! [`FeedEngine::get_page`] decides per request whether the cached ranked
//! list may answer it or upstream has to rank a new one:
//!
//! 1. Read the cached list and evaluate freshness concurrently.
//! 2. Fresh and non-empty: slice the cached list.
//! 3. Otherwise fetch upstream, write the result back in a detached task when
//!    it is non-empty, and slice the fresh list.
//!
//! Cache failures degrade to an upstream fetch. Upstream failures propagate;
//! a stale cached list is never served in their place.
//!
//! Concurrent misses on the same key are not coalesced. Each caller fetches
//! and writes independently and the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use feedline_core::{AppConfig, Error, FeedCache, FeedCacheKey, FeedScope, FreshnessPolicy, feed::slice_page};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::upstream::{FeedQuery, FeedSource};

#[cfg(test)]
mod tests;

/// Default number of ranked ids requested per generation.
pub const DEFAULT_FETCH_SIZE: usize = 500;

/// One page read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub key: FeedCacheKey,
    pub offset: usize,
    pub page_size: usize,
    pub feed_version: u32,
}

impl PageRequest {
    pub fn new(
        viewer_id: Option<&str>, feed_id: Option<&str>, offset: usize, page_size: usize, feed_version: u32,
    ) -> Self {
        Self { key: FeedCacheKey::for_ids(viewer_id, feed_id), offset, page_size, feed_version }
    }
}

/// Where a page was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    Cache,
    Upstream,
}

/// A slice of a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPage {
    pub post_ids: Vec<String>,
    /// Upstream continuation token, only present on upstream-served pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub source: PageSource,
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of the ranked list requested from upstream.
    pub fetch_size: usize,
    pub policy: FreshnessPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fetch_size: DEFAULT_FETCH_SIZE, policy: FreshnessPolicy::default() }
    }
}

impl From<&AppConfig> for EngineConfig {
    fn from(config: &AppConfig) -> Self {
        Self { fetch_size: config.fetch_size, policy: config.freshness_policy() }
    }
}

/// Cache-fronted feed reader.
#[derive(Debug)]
pub struct FeedEngine<S> {
    source: Arc<S>,
    cache: FeedCache,
    config: EngineConfig,
}

impl<S: FeedSource> FeedEngine<S> {
    pub fn new(source: Arc<S>, cache: FeedCache, config: EngineConfig) -> Self {
        Self { source, cache, config }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Serve one page.
    pub async fn get_page(&self, req: &PageRequest) -> Result<FeedPage, Error> {
        let key = &req.key;
        let (cached, fresh) = tokio::join!(self.read_cached(key), self.is_fresh(req.offset, key, req.feed_version));

        if fresh && !cached.is_empty() {
            tracing::debug!(%key, offset = req.offset, count = cached.len(), "feed cache hit");
            return Ok(FeedPage {
                post_ids: slice_page(&cached, req.offset, req.page_size),
                cursor: None,
                source: PageSource::Cache,
            });
        }

        tracing::debug!(%key, offset = req.offset, fresh, cached = cached.len(), "feed cache miss");

        let query = FeedQuery { key: key.clone(), page_size: self.config.fetch_size, feed_version: req.feed_version };
        let requested_at = Utc::now();
        let page = self.source.fetch(&query).await?;

        let post_ids = slice_page(&page.post_ids, req.offset, req.page_size);
        if !page.is_empty() {
            self.populate_cache(key.clone(), page.post_ids, requested_at);
        }

        Ok(FeedPage { post_ids, cursor: page.cursor, source: PageSource::Upstream })
    }

    /// Whether the cached list may serve a page at `offset`.
    ///
    /// Continuation pages skip the store entirely. A failed read counts as stale.
    pub async fn is_fresh(&self, offset: usize, key: &FeedCacheKey, feed_version: u32) -> bool {
        if offset > 0 {
            return true;
        }

        match self.cache.freshness_marks(key).await {
            Ok(marks) => self.config.policy.is_fresh(Utc::now(), offset, &marks, feed_version),
            Err(e) => {
                tracing::warn!(%key, error = %e, "freshness check failed, treating as stale");
                false
            }
        }
    }

    /// Write `post_ids` under `key` without waiting for the result.
    ///
    /// `generated_at` is when the list was requested from upstream, so a
    /// mutation marker bumped while the fetch was in flight still invalidates
    /// it. Failures are logged and dropped.
    pub fn populate_cache(
        &self, key: FeedCacheKey, post_ids: Vec<String>, generated_at: DateTime<Utc>,
    ) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let ttl = self.config.policy.hard_ttl;

        tokio::spawn(async move {
            match cache.write_feed(&key, &post_ids, generated_at, ttl).await {
                Ok(()) => tracing::debug!(%key, count = post_ids.len(), "feed cache populated"),
                Err(e) => tracing::warn!(%key, error = %e, "feed cache write failed"),
            }
        })
    }

    /// Bump the mutation marker of `feed`, returning the recorded time.
    ///
    /// Every viewer's next first-page read of the feed goes upstream.
    pub async fn mark_feed_updated(&self, feed: &FeedScope) -> Result<DateTime<Utc>, Error> {
        let now = Utc::now();
        self.cache.mark_feed_updated(feed, now, self.config.policy.hard_ttl).await?;
        tracing::info!(feed_id = feed.id().unwrap_or("global"), "feed marked updated");
        Ok(now)
    }

    async fn read_cached(&self, key: &FeedCacheKey) -> Vec<String> {
        match self.cache.cached_posts(key).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cached feed read failed, treating as miss");
                Vec::new()
            }
        }
    }
}
