//! Core types and shared functionality for feedline.
//!
//! This crate provides:
//! - Feed cache keys and a key-value store abstraction (SQLite, optionally Redis)
//! - The freshness oracle and page slicing
//! - Feed filter types and the filter resolver seam
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;

pub use cache::{CacheDb, CachedFeed, FeedCache, FeedCacheKey, FeedScope, KvStore, ViewerScope};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use feed::{FeedFilters, FilterResolver, FreshnessPolicy, StaticFilterResolver};
