//! Feed filters and the resolver seam that produces them.
//!
//! Filters come from the viewer's saved feed configuration, which lives
//! outside this engine. Every field is optional: an absent field places no
//! constraint on the ranking.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Inclusion and exclusion sets for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_sources: Option<Vec<String>>,
    /// Squads the feed is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_types: Option<Vec<String>>,
}

impl FeedFilters {
    /// True when no field constrains the feed.
    pub fn is_unconstrained(&self) -> bool {
        [&self.include_tags, &self.blocked_tags, &self.exclude_sources, &self.source_ids, &self.exclude_types]
            .into_iter()
            .all(|field| field.as_ref().is_none_or(Vec::is_empty))
    }
}

/// Resolves a feed's saved configuration into filters.
#[async_trait]
pub trait FilterResolver: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, feed_id: &str, viewer_id: Option<&str>) -> Result<FeedFilters, Error>;
}

/// Resolver backed by a fixed map of feed id to filters.
///
/// Feeds missing from the map resolve to no constraints.
#[derive(Debug, Clone, Default)]
pub struct StaticFilterResolver {
    filters: BTreeMap<String, FeedFilters>,
}

impl StaticFilterResolver {
    pub fn new(filters: BTreeMap<String, FeedFilters>) -> Self {
        Self { filters }
    }
}

#[async_trait]
impl FilterResolver for StaticFilterResolver {
    async fn resolve(&self, feed_id: &str, _viewer_id: Option<&str>) -> Result<FeedFilters, Error> {
        Ok(self.filters.get(feed_id).cloned().unwrap_or_default())
    }
}
