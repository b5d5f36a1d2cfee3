//! SQLite handle for the feed cache.
//!
//! The cache is one `kv_entries` table. Its schema version is stamped in
//! SQLite's `user_version` header field, so opening a file is a single
//! compare: older files get the schema applied, newer files are refused.

use std::path::Path;

use tokio_rusqlite::Connection;

use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// Version written to `user_version` once [`SCHEMA`] is in place.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = include_str!("../../schema/kv_entries.sql");

/// Feed cache database.
///
/// Statements run on tokio-rusqlite's background thread; clones share it.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the cache file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Private in-memory cache, used by tests and throwaway engines.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| -> Result<(), Error> {
            conn.execute_batch(PRAGMAS)?;

            let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            if found > SCHEMA_VERSION {
                return Err(Error::UnsupportedSchema { found, supported: SCHEMA_VERSION });
            }

            if found < SCHEMA_VERSION {
                let tx = conn.transaction()?;
                tx.execute_batch(SCHEMA)?;
                tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
                tx.commit()?;
                tracing::debug!(from = found, to = SCHEMA_VERSION, "feed cache schema applied");
            }

            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Schema version stamped in the open file.
    pub async fn schema_version(&self) -> Result<i64, Error> {
        self.conn
            .call(|conn| -> Result<i64, Error> { Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?) })
            .await
            .map_err(Error::from)
    }
}
