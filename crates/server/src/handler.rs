//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    FeedPageParams, FeedTouchParams, PageLimits,
    cache::{CachePurgeParams, CacheInspectParams, inspect_impl, purge_impl},
    feed_page_impl, feed_touch_impl,
};
use feedline_client::{FeedClient, FeedEngine};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for feedline.
#[derive(Clone)]
pub struct FeedServer {
    engine: Arc<FeedEngine<FeedClient>>,
    limits: PageLimits,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FeedServer {
    /// Create a new server handler.
    pub fn new(engine: Arc<FeedEngine<FeedClient>>, limits: PageLimits) -> Self {
        Self { engine, limits, tool_router: Self::tool_router() }
    }

    /// Serve one page of a ranked feed.
    ///
    /// First pages come from cache while the cached list is fresh; continuation
    /// pages always come from the list that produced the first page.
    #[tool(
        description = "Get one page of a ranked feed for a viewer. Returns post ids in ranked order and whether the page came from cache or upstream."
    )]
    async fn feed_page(&self, params: Parameters<FeedPageParams>) -> Result<CallToolResult, McpError> {
        feed_page_impl(&self.engine, &self.limits, params.0).await
    }

    /// Record a feed configuration change.
    #[tool(description = "Mark a feed as reconfigured so every viewer's next first page is ranked anew.")]
    async fn feed_touch(&self, params: Parameters<FeedTouchParams>) -> Result<CallToolResult, McpError> {
        feed_touch_impl(&self.engine, params.0).await
    }

    /// Retrieve a cached feed entry.
    #[tool(description = "Show the cached ranked list for a feed and viewer, with its generation and mutation times.")]
    async fn cache_inspect(&self, params: Parameters<CacheInspectParams>) -> Result<CallToolResult, McpError> {
        inspect_impl(self.engine.cache(), params.0).await
    }

    /// Purge expired entries.
    #[tool(description = "Remove expired cache entries, and optionally evict one feed entry. Returns the number deleted.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.engine.cache(), params.0).await
    }
}

impl ServerHandler for FeedServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "feedline".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Cache-fronted ranked feeds. Use feed_page with offset 0 for a first page and increasing offsets to scroll."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
