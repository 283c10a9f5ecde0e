//! search_site: search the document library of one SharePoint site.
//!
//! The site is named either by a configured alias (`site_aliases`, alias to
//! site id) or by hostname and server-relative path, resolved through Graph.

use m365_client::graph::search::MAX_SEARCH_SIZE;
use m365_core::{DriveItem, Error};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::search::EMPTY_QUERY_MESSAGE;
use crate::state::AppState;

pub const SITE_NOT_FOUND_MESSAGE: &str = "Site not found.";

/// Parameters for search_site.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSiteParams {
    /// Site host, e.g. `contoso.sharepoint.com`.
    #[serde(default)]
    pub site_hostname: Option<String>,

    /// Server-relative site path, e.g. `/sites/Finance`.
    #[serde(default)]
    pub site_path: Option<String>,

    /// A configured site alias; takes precedence over hostname and path.
    #[serde(default)]
    pub site_name: Option<String>,

    pub query: String,

    /// Maximum items returned, 1-500 (default: 10).
    #[serde(default = "super::default_max_results")]
    pub max_results: u32,
}

/// One item found in a site library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SiteFile {
    pub name: String,
    pub id: String,
    #[serde(rename = "webUrl")]
    pub web_url: Option<String>,
}

impl From<DriveItem> for SiteFile {
    fn from(item: DriveItem) -> Self {
        Self { name: item.name, id: item.id, web_url: item.web_url }
    }
}

/// Output of search_site.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSiteOutput {
    pub count: usize,
    pub files: Vec<SiteFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchSiteOutput {
    fn empty(message: &str) -> Self {
        Self { count: 0, files: Vec::new(), message: Some(message.to_string()) }
    }
}

pub async fn search_site_impl(state: &AppState, params: SearchSiteParams) -> Result<SearchSiteOutput, Error> {
    tracing::info!(
        site_hostname = ?params.site_hostname,
        site_path = ?params.site_path,
        site_name = ?params.site_name,
        query = %params.query,
        "search_site invoked"
    );

    if params.query.trim().is_empty() {
        return Ok(SearchSiteOutput::empty(EMPTY_QUERY_MESSAGE));
    }
    if params.max_results == 0 || params.max_results > MAX_SEARCH_SIZE {
        return Err(Error::InvalidInput(format!("max_results must be 1-{MAX_SEARCH_SIZE}")));
    }

    let Some(site_id) = resolve_site_id(state, &params).await? else {
        tracing::warn!("site could not be resolved");
        return Ok(SearchSiteOutput::empty(SITE_NOT_FOUND_MESSAGE));
    };

    let items = state
        .graph
        .search_site_drive(&site_id, params.query.trim(), params.max_results)
        .await?;
    let files: Vec<SiteFile> = items.into_iter().map(SiteFile::from).collect();
    Ok(SearchSiteOutput { count: files.len(), files, message: None })
}

/// Alias lookup first, then Graph resolution by hostname and path.
async fn resolve_site_id(state: &AppState, params: &SearchSiteParams) -> Result<Option<String>, Error> {
    let name = params.site_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let hostname = params.site_hostname.as_deref().map(str::trim).filter(|h| !h.is_empty());

    if let Some(name) = name {
        if let Some(id) = state.config.site_aliases.get(name) {
            tracing::debug!(site_name = name, site_id = %id, "site alias matched");
            return Ok(Some(id.clone()));
        }
        if hostname.is_none() {
            return Ok(None);
        }
    }

    let Some(hostname) = hostname else {
        return Err(Error::InvalidInput("site_hostname or site_name is required".into()));
    };
    let path = params.site_path.as_deref().unwrap_or_default();
    let site = state.graph.resolve_site(hostname, path).await?;
    Ok(site.map(|s| s.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, testing};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(hostname: Option<&str>, site_path: Option<&str>, name: Option<&str>) -> SearchSiteParams {
        SearchSiteParams {
            site_hostname: hostname.map(str::to_string),
            site_path: site_path.map(str::to_string),
            site_name: name.map(str::to_string),
            query: "budget".into(),
            max_results: 10,
        }
    }

    async fn mount_site_search(server: &MockServer, site_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/sites/{site_id}/drive/root/search(q='budget')")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [
                {"id": "1", "name": "Budget.xlsx", "webUrl": "https://contoso.sharepoint.com/Budget.xlsx", "file": {}}
            ]})))
            .mount(server)
            .await;
    }

    fn with_alias(state: AppState, alias: &str, id: &str) -> AppState {
        let mut config = (*state.config).clone();
        config.site_aliases.insert(alias.into(), id.into());
        AppState { config: std::sync::Arc::new(config), ..state }
    }

    #[tokio::test]
    async fn test_hostname_and_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/contoso.sharepoint.com:/sites/Finance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "site-fin"})))
            .mount(&server)
            .await;
        mount_site_search(&server, "site-fin").await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_site_impl(&state, params(Some("contoso.sharepoint.com"), Some("sites/Finance"), None))
            .await
            .unwrap();
        assert_eq!(output.count, 1);
        assert_eq!(output.files[0].web_url.as_deref(), Some("https://contoso.sharepoint.com/Budget.xlsx"));
    }

    #[tokio::test]
    async fn test_alias() {
        let server = MockServer::start().await;
        mount_site_search(&server, "site-hr").await;
        let tmp = tempfile::tempdir().unwrap();
        let state = with_alias(testing::state(&server, tmp.path()).await, "HR", "site-hr");

        let output = search_site_impl(&state, params(None, None, Some("HR"))).await.unwrap();
        assert_eq!(output.count, 1);
    }

    #[tokio::test]
    async fn test_unknown_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/contoso.sharepoint.com:/sites/Nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_site_impl(&state, params(Some("contoso.sharepoint.com"), Some("/sites/Nope"), None))
            .await
            .unwrap();
        assert_eq!(output.message.as_deref(), Some(SITE_NOT_FOUND_MESSAGE));

        let output = search_site_impl(&state, params(None, None, Some("Unknown"))).await.unwrap();
        assert_eq!(output.count, 0);
        assert_eq!(output.message.as_deref(), Some(SITE_NOT_FOUND_MESSAGE));
    }

    #[tokio::test]
    async fn test_site_required() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let err = search_site_impl(&state, params(None, None, None)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
