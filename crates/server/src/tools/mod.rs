//! MCP tool implementations.
//!
//! This module contains all tools exposed by the feedline server.

pub mod cache;
pub mod feed_page;
pub mod feed_touch;

#[cfg(test)]
mod test_support;

pub use feed_page::{FeedPageParams, PageLimits, feed_page_impl};
pub use feed_touch::{FeedTouchParams, feed_touch_impl};
