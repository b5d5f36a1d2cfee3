//! Redis implementation of the key-value store.
//!
//! Used when several engine processes share one cache keyspace. Expiry is
//! native (`SET … EX`), so `purge_expired` has nothing to do.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::store::KvStore;
use crate::Error;

/// Redis-backed store using a reconnecting `ConnectionManager`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    redis_url: String,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("redis_url", &self.redis_url)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to the Redis server at `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, Error> {
        tracing::info!(redis_url, "connecting feed cache to redis");
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, redis_url: redis_url.to_string() })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Option<Duration>) -> Result<(), Error> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &entries {
            match ttl {
                Some(ttl) => pipe.set_ex(key, value, ttl.as_secs().max(1)).ignore(),
                None => pipe.set(key, value).ignore(),
            };
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        Ok(0)
    }
}
