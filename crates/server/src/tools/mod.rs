//! Operations shared by the MCP tools and the HTTP routes.
//!
//! Each module defines its parameter and output types plus an `*_impl`
//! function returning `m365_core::Error`; the surfaces adapt the result.

pub mod cache_purge;
pub mod crawl;
pub mod file_content;
pub mod search;
pub mod search_site;

pub use cache_purge::{CachePurgeOutput, CachePurgeParams, purge_impl};
pub use crawl::{CrawlOutput, CrawlParams, crawl_impl};
pub use file_content::{FileContentOutput, FileContentParams, file_content_impl};
pub use search::{SearchOutput, SearchParams, search_impl};
pub use search_site::{SearchSiteOutput, SearchSiteParams, search_site_impl};

use m365_core::Error;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Render an operation output as a pretty JSON text tool result.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn default_max_results() -> u32 {
    10
}
