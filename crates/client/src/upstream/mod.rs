//! Recommendation service client.
//!
//! Fetches a ranked list of post ids for one feed and viewer. Ranking is
//! entirely upstream; this client only shapes the query and normalizes the
//! answer.
//!
//! ### Contract
//!
//! - **Request**: `GET <endpoint>?page_size=&fresh_page_size=&feed_version=[&user_id=]&feed_id=`
//!   plus `allowed_tags`, `blocked_tags`, `blocked_sources`, `squad_ids` for scoped feeds.
//! - **Endpoint**: the legacy feed version goes to the legacy endpoint, every
//!   other version to the primary one.
//! - **Errors**: any non-2xx status fails the call. No retries at this layer.
//! - **Empty results** are not errors, but are logged as warnings.

pub mod error;
pub mod request;
pub mod response;

pub use error::UpstreamError;
pub use request::{FeedRequest, GLOBAL_FEED_ID, fresh_page_size};
pub use response::{FeedApiResponse, RankedPost, UpstreamPage};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use feedline_core::{AppConfig, Error, FeedCacheKey, FilterResolver};
use reqwest::header;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "feedline/0.1";

/// One upstream fetch as the engine asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub key: FeedCacheKey,
    /// Length of the ranked list to request.
    pub page_size: usize,
    pub feed_version: u32,
}

/// Source of freshly ranked feed lists.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, query: &FeedQuery) -> Result<UpstreamPage, Error>;
}

/// Upstream client configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Primary recommendation endpoint.
    pub feed_url: String,
    /// Legacy/internal endpoint.
    pub legacy_feed_url: String,
    /// Feed version routed to `legacy_feed_url`.
    pub legacy_version: u32,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: feedline/0.x).
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            feed_url: app.feed_url,
            legacy_feed_url: app.legacy_feed_url,
            legacy_version: app.legacy_feed_version,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for UpstreamConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            legacy_feed_url: config.legacy_feed_url.clone(),
            legacy_version: config.legacy_feed_version,
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// HTTP client for the recommendation service.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    resolver: Arc<dyn FilterResolver>,
}

impl FeedClient {
    /// Create a new client. `resolver` supplies filters for scoped feeds.
    pub fn new(config: UpstreamConfig, resolver: Arc<dyn FilterResolver>) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Network(Arc::new(e)))?;

        Ok(Self { http, config, resolver })
    }

    /// Endpoint serving `feed_version`.
    pub fn endpoint_for(&self, feed_version: u32) -> &str {
        if feed_version == self.config.legacy_version { &self.config.legacy_feed_url } else { &self.config.feed_url }
    }

    /// Execute one feed request.
    pub async fn fetch_feed(&self, req: &FeedRequest) -> Result<UpstreamPage, UpstreamError> {
        req.validate()?;

        let start = Instant::now();
        let url = self.endpoint_for(req.feed_version);

        tracing::debug!(url, feed_id = %req.feed_id, feed_version = req.feed_version, "requesting ranked feed");

        let http_response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), feed_id = %req.feed_id, "upstream feed request failed");
            return Err(UpstreamError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: FeedApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Parse(e.to_string()))?;
        let page = UpstreamPage::from(api_response);

        if page.is_empty() {
            tracing::warn!(
                feed_id = %req.feed_id,
                user_id = req.user_id.as_deref().unwrap_or("anonymous"),
                feed_version = req.feed_version,
                page_size = req.page_size,
                "upstream returned an empty feed"
            );
        } else {
            tracing::debug!(count = page.len(), elapsed = ?start.elapsed(), "ranked feed received");
        }

        Ok(page)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    /// Resolve filters for scoped feeds, then fetch.
    async fn fetch(&self, query: &FeedQuery) -> Result<UpstreamPage, Error> {
        let mut request = FeedRequest::new(&query.key, query.page_size, query.feed_version);

        if let Some(feed_id) = query.key.feed.id() {
            let filters = self.resolver.resolve(feed_id, query.key.viewer.id()).await?;
            if filters.is_unconstrained() {
                tracing::debug!(feed_id, "feed has no filters");
            } else {
                request = request.with_filters(&filters);
            }
        }

        Ok(self.fetch_feed(&request).await?)
    }
}
