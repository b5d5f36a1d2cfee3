//! Feed cache storage.
//!
//! This module provides the TTL-bearing key-value store the engine caches
//! ranked feeds in, and a typed feed view on top of it:
//!
//! - Key derivation per (feed, viewer) pair plus a per-feed mutation marker
//! - A SQLite backend via tokio-rusqlite (WAL mode, schema stamped in `user_version`)
//! - A Redis backend for shared deployments (`redis` feature)

pub mod connection;
pub mod entries;
pub mod feed;
pub mod keys;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod store;

use std::sync::Arc;

pub use crate::Error;

pub use connection::CacheDb;
pub use feed::{CachedFeed, FeedCache, format_timestamp};
pub use keys::{FeedCacheKey, FeedScope, ViewerScope};
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use store::KvStore;

use crate::config::AppConfig;

/// Open the store selected by configuration.
///
/// Redis is used when `redis_url` is set, SQLite at `db_path` otherwise.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn KvStore>, Error> {
    match config.redis_url.as_deref() {
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(RedisStore::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(Error::InvalidInput(
            "redis_url is set but feedline was built without the `redis` feature".into(),
        )),
        None => {
            tracing::info!(path = %config.db_path.display(), "opening sqlite feed cache");
            Ok(Arc::new(CacheDb::open(&config.db_path).await?))
        }
    }
}
