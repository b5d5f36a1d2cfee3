//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and purging the feed cache.

pub mod get;
pub mod purge;

pub use get::{CacheInspectParams, inspect_impl};
pub use purge::{CachePurgeParams, purge_impl, spawn_purge_task};
