//! Microsoft Graph REST client.
//!
//! Thin wrapper over the Graph v1.0 endpoints used for search, crawl and
//! download. Every request carries a bearer token from the configured
//! [`TokenProvider`]; non-success statuses become [`GraphError::Status`].
//!
//! - `POST /search/query`: tenant-wide driveItem search
//! - `GET /drives/{drive}/root/children`, `/items/{id}/children`: folder listing
//! - `GET /drives/{drive}/items/{id}`, `/content`: metadata and raw bytes
//! - `GET /sites/{hostname}:{path}`: site id resolution
//! - `GET /sites/{id}/drive/root/search(q='...')`: site library search

pub mod drive;
pub mod error;
pub mod search;

pub use drive::{ItemPage, RemoteItem, Site};
pub use error::GraphError;
pub use search::{SearchRequest, SearchResponse, classify_source};

use std::sync::Arc;
use std::time::{Duration, Instant};

use m365_core::{AppConfig, DriveItem};
use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;

use crate::auth::TokenProvider;

/// Default Graph endpoint.
const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "m365-search/0.1";

/// Graph client configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Base URL including the API version (default: https://graph.microsoft.com/v1.0).
    pub base_url: String,
    /// Request timeout (default: 30s).
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GraphConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Build the shared HTTP client used for Graph and token requests.
    pub fn http_client(&self) -> Result<reqwest::Client, GraphError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(GraphError::from)
    }
}

/// Microsoft Graph client.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl GraphClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: GraphConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, GraphError> {
        let http = config.http_client()?;
        Ok(Self::with_http(http, config, tokens))
    }

    /// Create a client sharing an existing HTTP connection pool.
    pub fn with_http(http: reqwest::Client, config: GraphConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { http, config, tokens }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Run a driveItem search and return the raw response body.
    ///
    /// The body is returned unparsed so callers can cache it verbatim.
    pub async fn search(&self, req: &SearchRequest) -> Result<String, GraphError> {
        let start = Instant::now();
        let url = format!("{}/search/query", self.config.base_url);
        tracing::debug!(query = %req.query, region = %req.region, size = req.size, "searching Graph");

        let response = self.send(self.http.post(&url).json(&req.to_body()), None).await?;
        let body = response.text().await?;

        tracing::debug!(elapsed = ?start.elapsed(), bytes = body.len(), "search completed");
        Ok(body)
    }

    /// URL of the first children page of `parent_id`, or of the drive root.
    pub fn children_url(&self, drive_id: &str, parent_id: Option<&str>) -> String {
        let drive = urlencoding::encode(drive_id);
        match parent_id {
            Some(id) => format!("{}/drives/{drive}/items/{}/children", self.config.base_url, urlencoding::encode(id)),
            None => format!("{}/drives/{drive}/root/children", self.config.base_url),
        }
    }

    /// Fetch one page of a children listing.
    ///
    /// `url` is either from [`children_url`](Self::children_url) or a
    /// previous page's `@odata.nextLink`.
    pub async fn list_children(&self, url: &str) -> Result<ItemPage, GraphError> {
        self.get_json(url, None).await
    }

    /// Item metadata (name, size, facets).
    pub async fn item(&self, drive_id: &str, item_id: &str) -> Result<RemoteItem, GraphError> {
        let url = self.item_url(drive_id, item_id);
        self.get_json(&url, None).await
    }

    /// Start a content download; the body is left for the caller to stream.
    pub async fn content(&self, drive_id: &str, item_id: &str) -> Result<Response, GraphError> {
        let url = format!("{}/content", self.item_url(drive_id, item_id));
        self.send(self.http.get(&url), None).await
    }

    /// Resolve a SharePoint site id from its hostname and server-relative path.
    ///
    /// Returns `None` when Graph reports the site does not exist.
    pub async fn resolve_site(&self, hostname: &str, path: &str) -> Result<Option<Site>, GraphError> {
        let path = path.trim_matches('/');
        let url = if path.is_empty() {
            format!("{}/sites/{hostname}", self.config.base_url)
        } else {
            let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
            format!("{}/sites/{hostname}:/{}", self.config.base_url, encoded.join("/"))
        };

        match self.get_json::<Site>(&url, None).await {
            Ok(site) => Ok(Some(site)),
            Err(GraphError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Search the default document library of a site.
    pub async fn search_site_drive(&self, site_id: &str, query: &str, top: u32) -> Result<Vec<DriveItem>, GraphError> {
        let escaped = query.replace('\'', "''");
        let url = format!(
            "{}/sites/{site_id}/drive/root/search(q='{}')",
            self.config.base_url,
            urlencoding::encode(&escaped)
        );

        let request = self.http.get(&url).query(&[("$top", top)]);
        let page: ItemPage = decode(self.send(request, None).await?).await?;
        Ok(page.value.into_iter().map(DriveItem::from).collect())
    }

    /// Root children of the signed-in user's OneDrive, using their own token.
    pub async fn my_drive_children(&self, user_token: &str) -> Result<serde_json::Value, GraphError> {
        let url = format!("{}/me/drive/root/children", self.config.base_url);
        self.get_json(&url, Some(user_token)).await
    }

    /// Signed-in user's profile, using their own token.
    pub async fn me(&self, user_token: &str) -> Result<serde_json::Value, GraphError> {
        let url = format!("{}/me", self.config.base_url);
        self.get_json(&url, Some(user_token)).await
    }

    fn item_url(&self, drive_id: &str, item_id: &str) -> String {
        format!(
            "{}/drives/{}/items/{}",
            self.config.base_url,
            urlencoding::encode(drive_id),
            urlencoding::encode(item_id)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T, GraphError> {
        decode(self.send(self.http.get(url), token).await?).await
    }

    /// Attach auth headers, send, and turn error statuses into `GraphError::Status`.
    ///
    /// `token` overrides the provider for user-delegated calls.
    async fn send(&self, request: RequestBuilder, token: Option<&str>) -> Result<Response, GraphError> {
        let bearer = match token {
            Some(t) => t.to_string(),
            None => self.tokens.access_token().await?,
        };

        let response = request
            .bearer_auth(bearer)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "Graph response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(%status, "Graph rejected the access token");
        }
        Err(GraphError::Status { status: status.as_u16(), body })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GraphError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| GraphError::Parse(e.to_string()))
}
