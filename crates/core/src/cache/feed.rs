//! Typed feed cache operations on top of a [`KvStore`].
//!
//! A cached feed is two values written together, the ordered id list and its
//! generation timestamp. The per-feed mutation marker is written by whoever
//! edits the feed configuration and is only ever compared, never joined, with
//! an entry: the two writes are independent and may race.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::keys::{FeedCacheKey, FeedScope};
use super::store::KvStore;
use crate::Error;
use crate::feed::FreshnessMarks;

/// Diagnostic snapshot of one cached feed.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedFeed {
    /// Key prefix of the entry, `feeds:<feed>:<viewer>`.
    pub key: String,
    pub post_ids: Vec<String>,
    /// RFC 3339 generation time of the list.
    pub generated_at: Option<String>,
    /// RFC 3339 time of the feed's last configuration change.
    pub updated_at: Option<String>,
}

/// Feed-shaped view over a shared key-value store.
#[derive(Debug, Clone)]
pub struct FeedCache {
    store: Arc<dyn KvStore>,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(key: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, Error> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(&value)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| Error::CorruptEntry { key: key.to_string(), reason: e.to_string() })
    })
    .transpose()
}

impl FeedCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Read the cached id list for `key`.
    ///
    /// A missing entry reads as an empty list.
    pub async fn cached_posts(&self, key: &FeedCacheKey) -> Result<Vec<String>, Error> {
        let posts_key = key.posts_key();
        match self.store.get(&posts_key).await? {
            Some(json) => serde_json::from_str(&json).map_err(|e| Error::CorruptEntry { key: posts_key, reason: e.to_string() }),
            None => Ok(Vec::new()),
        }
    }

    /// Read the generation time of `key` and its feed's mutation marker in one batch.
    pub async fn freshness_marks(&self, key: &FeedCacheKey) -> Result<FreshnessMarks, Error> {
        let keys = [key.time_key(), key.update_key()];
        let mut values = self.store.get_many(&keys).await?.into_iter();

        let generated_at = parse_timestamp(&keys[0], values.next().flatten())?;
        let updated_at = parse_timestamp(&keys[1], values.next().flatten())?;

        Ok(FreshnessMarks { generated_at, updated_at })
    }

    /// Replace the cached list for `key`.
    ///
    /// The list and its timestamp go to the store in one `set_many` call, so
    /// readers never observe one without the other.
    pub async fn write_feed(
        &self, key: &FeedCacheKey, post_ids: &[String], generated_at: DateTime<Utc>, ttl: Duration,
    ) -> Result<(), Error> {
        let posts = serde_json::to_string(post_ids)
            .map_err(|e| Error::CorruptEntry { key: key.posts_key(), reason: e.to_string() })?;

        self.store
            .set_many(
                vec![(key.posts_key(), posts), (key.time_key(), format_timestamp(generated_at))],
                Some(ttl),
            )
            .await
    }

    /// Bump the mutation marker of `feed`, invalidating every viewer's page-1 cache.
    pub async fn mark_feed_updated(&self, feed: &FeedScope, at: DateTime<Utc>, ttl: Duration) -> Result<(), Error> {
        self.store
            .set_many(vec![(feed.update_key(), format_timestamp(at))], Some(ttl))
            .await
    }

    /// Drop the cached list for `key`. The feed's marker is left alone.
    pub async fn evict(&self, key: &FeedCacheKey) -> Result<u64, Error> {
        self.store.delete(&[key.posts_key(), key.time_key()]).await
    }

    /// Snapshot the entry for `key`, or `None` when nothing is cached.
    pub async fn inspect(&self, key: &FeedCacheKey) -> Result<Option<CachedFeed>, Error> {
        let keys = [key.posts_key(), key.time_key(), key.update_key()];
        let mut values = self.store.get_many(&keys).await?.into_iter();

        let posts = values.next().flatten();
        let generated_at = values.next().flatten();
        let updated_at = values.next().flatten();

        let Some(posts) = posts else {
            return Ok(None);
        };
        let post_ids =
            serde_json::from_str(&posts).map_err(|e| Error::CorruptEntry { key: keys[0].clone(), reason: e.to_string() })?;

        Ok(Some(CachedFeed { key: key.to_string(), post_ids, generated_at, updated_at }))
    }
}
