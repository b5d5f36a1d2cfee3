//! Key-value store abstraction shared by the cache backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

/// A TTL-aware string key-value store.
///
/// Implementations must treat expired entries as absent.
#[async_trait]
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Read a single value.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Read several values in one round trip.
    ///
    /// The result has one slot per requested key, in request order.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error>;

    /// Write all entries as one unit, each expiring after `ttl` when given.
    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Option<Duration>) -> Result<(), Error>;

    /// Delete keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, Error>;

    /// Physically remove expired entries, returning the number removed.
    ///
    /// Backends with native expiry report zero.
    async fn purge_expired(&self) -> Result<u64, Error>;
}
