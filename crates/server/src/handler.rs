//! MCP server handler implementation.
//!
//! Routes tool calls to the shared operations and serves drive item text
//! through the `microsoft365://{driveid}/{fileid}` resource template.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListResourceTemplatesResult, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde_json::json;

use crate::state::AppState;
use crate::tools::{
    self, CachePurgeParams, CrawlParams, FileContentParams, SearchParams, SearchSiteParams, json_result,
};

/// URI scheme of drive item resources.
pub const RESOURCE_SCHEME: &str = "microsoft365://";

const RESOURCE_TEMPLATE: &str = "microsoft365://{driveid}/{fileid}";

/// The MCP server handler for m365-search.
#[derive(Clone)]
pub struct M365Server {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl M365Server {
    pub fn new(state: AppState) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Search SharePoint and OneDrive files across the tenant.
    #[tool(
        description = "Search Microsoft 365 files (SharePoint/OneDrive) by query and file type. Returns name, url, summary, source, authorship, fileid and drive_id of each hit."
    )]
    async fn search_m365_files(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        json_result(&tools::search_impl(&self.state, params.0).await?)
    }

    /// Download a file and return its extracted text.
    #[tool(
        description = "Get the text content of a Microsoft 365 file by drive id and file id. Spreadsheets are paged by offset/limit rows per sheet."
    )]
    async fn get_file_content(&self, params: Parameters<FileContentParams>) -> Result<CallToolResult, McpError> {
        json_result(&tools::file_content_impl(&self.state, params.0).await?)
    }

    /// Recursively list the files of a drive.
    #[tool(description = "Recursively list all files in a drive, optionally filtered by file extension.")]
    async fn crawl_drive(&self, params: Parameters<CrawlParams>) -> Result<CallToolResult, McpError> {
        json_result(&tools::crawl_impl(&self.state, params.0).await?)
    }

    /// Search within one SharePoint site's document library.
    #[tool(
        description = "Search files in one SharePoint site, named by hostname and path or by a configured site alias."
    )]
    async fn search_site(&self, params: Parameters<SearchSiteParams>) -> Result<CallToolResult, McpError> {
        json_result(&tools::search_site_impl(&self.state, params.0).await?)
    }

    /// Purge expired cache entries.
    #[tool(description = "Delete expired search responses and stale downloaded files from the local cache.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        json_result(&tools::purge_impl(&self.state, params.0).await?)
    }
}

/// Split `microsoft365://{driveid}/{fileid}` into its ids.
pub fn parse_resource_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix(RESOURCE_SCHEME)?;
    let (drive_id, item_id) = rest.split_once('/')?;
    if drive_id.is_empty() || item_id.is_empty() || item_id.contains('/') {
        return None;
    }
    Some((drive_id, item_id))
}

fn file_content_template() -> Result<ResourceTemplate, McpError> {
    serde_json::from_value(json!({
        "uriTemplate": RESOURCE_TEMPLATE,
        "name": "Get File Content",
        "description": "Get content of a Microsoft 365 file by drive id and file id.",
        "mimeType": "application/json",
    }))
    .map_err(|e| McpError::internal_error(format!("invalid resource template: {e}"), None))
}

impl ServerHandler for M365Server {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "m365-search".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            instructions: Some(
                "Search, crawl and read files stored in SharePoint and OneDrive through Microsoft Graph.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }

    async fn list_resource_templates(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            meta: None,
            resource_templates: vec![file_content_template()?],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self, request: ReadResourceRequestParam, _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let Some((drive_id, item_id)) = parse_resource_uri(&request.uri) else {
            return Err(McpError::resource_not_found(
                format!("expected {RESOURCE_TEMPLATE}, got {}", request.uri),
                None,
            ));
        };

        let params = FileContentParams {
            driveid: drive_id.to_string(),
            fileid: item_id.to_string(),
            offset: 0,
            limit: m365_core::RowWindow::DEFAULT_LIMIT,
        };
        let output = tools::file_content_impl(&self.state, params).await?;
        let text = serde_json::to_string_pretty(&output.content)
            .map_err(|e| McpError::internal_error(format!("Failed to serialize output: {e}"), None))?;

        Ok(ReadResourceResult { contents: vec![ResourceContents::text(text, request.uri)] })
    }
}
