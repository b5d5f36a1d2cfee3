//! Unified error types for feedline.
//!
//! Every variant renders with a stable code prefix so logs and tool
//! responses can be matched on without parsing free-form text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the feed engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., page size out of range).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No cache entry exists for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// SQLite operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Redis operation failed.
    #[cfg(feature = "redis")]
    #[error("CACHE_ERROR: {0}")]
    Redis(#[from] redis::RedisError),

    /// The cache file was written by a newer schema than this build knows.
    #[error("CACHE_ERROR: cache schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },

    /// A stored value could not be decoded.
    #[error("CACHE_ERROR: corrupt entry at {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// The filter resolver could not produce filters for a feed.
    #[error("FILTERS_FAILED: {0}")]
    FilterResolution(String),

    /// Upstream answered with a non-2xx status.
    #[error("UPSTREAM_STATUS: {0}")]
    UpstreamStatus(u16),

    /// Upstream could not be reached or returned an unreadable body.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),

    /// Upstream did not answer within the client timeout.
    #[error("UPSTREAM_TIMEOUT: {0}")]
    UpstreamTimeout(String),
}

impl Error {
    /// Whether this error originated in the cache layer.
    ///
    /// Cache-layer failures never reach callers of the engine; they degrade
    /// to an upstream fetch instead.
    pub fn is_cache_error(&self) -> bool {
        match self {
            Error::Database(_) | Error::UnsupportedSchema { .. } | Error::CorruptEntry { .. } => true,
            #[cfg(feature = "redis")]
            Error::Redis(_) => true,
            _ => false,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::CacheMiss(_) => -32001,
            e if e.is_cache_error() => -32002,
            Error::FilterResolution(_) => -32003,
            Error::UpstreamStatus(_) => -32004,
            Error::Upstream(_) => -32005,
            Error::UpstreamTimeout(_) => -32006,
            _ => -32000,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
