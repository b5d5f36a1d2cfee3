//! Client code for feedline.
//!
//! This crate provides the recommendation service HTTP client and the
//! cache-fronted read engine shared by the server.

pub mod engine;
pub mod upstream;

pub use engine::{EngineConfig, FeedEngine, FeedPage, PageRequest, PageSource};

pub use upstream::{FeedClient, FeedQuery, FeedRequest, FeedSource, UpstreamConfig, UpstreamError, UpstreamPage};
