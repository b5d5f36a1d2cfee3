//! SQLite implementation of the key-value store.
//!
//! Entries live in the `kv_entries` table with an optional absolute expiry in
//! epoch milliseconds. Expired rows stay on disk until `purge_expired` runs
//! but are never returned by reads.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use super::store::KvStore;
use crate::Error;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn expiry_millis(ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_millis().saturating_add(ttl_ms)
}

#[async_trait]
impl KvStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut values = self.get_many(&[key.to_string()]).await?;
        Ok(values.pop().flatten())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        let keys = keys.to_vec();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<Vec<Option<String>>, Error> {
                let mut stmt = conn.prepare_cached(
                    "SELECT value FROM kv_entries
                    WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                )?;

                let mut values = Vec::with_capacity(keys.len());
                for key in &keys {
                    values.push(stmt.query_row(params![key, now], |row| row.get(0)).optional()?);
                }
                Ok(values)
            })
            .await
            .map_err(Error::from)
    }

    /// Upserts every entry inside one transaction.
    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Option<Duration>) -> Result<(), Error> {
        let expires_at = ttl.map(expiry_millis);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                        ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            expires_at = excluded.expires_at",
                    )?;
                    for (key, value) in &entries {
                        stmt.execute(params![key, value, expires_at])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, Error> {
        let keys = keys.to_vec();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let mut stmt = conn.prepare_cached("DELETE FROM kv_entries WHERE key = ?1")?;
                let mut deleted = 0u64;
                for key in &keys {
                    deleted += stmt.execute(params![key])? as u64;
                }
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
