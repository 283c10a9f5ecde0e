//! search_m365_files: tenant-wide driveItem search.

use m365_client::SearchRequest;
use m365_client::graph::SearchResponse;
use m365_core::{Error, FileHit, FileType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub const EMPTY_QUERY_MESSAGE: &str = "Please provide a valid search query.";
pub const NO_RESULTS_MESSAGE: &str = "No results found.";

/// Parameters for search_m365_files.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Free-text query (KQL is accepted).
    pub query: String,

    /// Restrict hits to a file category (default: all).
    #[serde(default)]
    pub file_type: FileType,

    /// Page size requested from Graph, 1-500 (default: 10).
    #[serde(default = "super::default_max_results")]
    pub max_results: u32,

    /// Zero-based offset of the first hit.
    #[serde(default)]
    pub from: u32,

    /// Bypass the search response cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output of search_m365_files.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchOutput {
    pub count: usize,
    pub files: Vec<FileHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchOutput {
    fn empty(message: &str) -> Self {
        Self { count: 0, files: Vec::new(), message: Some(message.to_string()) }
    }
}

pub async fn search_impl(state: &AppState, params: SearchParams) -> Result<SearchOutput, Error> {
    tracing::info!(
        query = %params.query,
        file_type = ?params.file_type,
        max_results = params.max_results,
        "search_m365_files invoked"
    );

    if params.query.trim().is_empty() {
        tracing::warn!("Empty query received");
        return Ok(SearchOutput::empty(EMPTY_QUERY_MESSAGE));
    }

    let mut request = SearchRequest::new(params.query.trim(), params.max_results, state.region);
    request.from = params.from;
    request.validate()?;

    let key = request.cache_key();
    let cached = if params.force_refresh {
        None
    } else {
        match state.db.get_fresh_search(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "search cache read failed");
                None
            }
        }
    };

    let body = match cached {
        Some(body) => {
            tracing::debug!(query = %request.query, "search cache hit");
            body
        }
        None => {
            let body = state.graph.search(&request).await?;
            let query_json = request.to_body().to_string();
            if let Err(e) = state
                .db
                .put_search(&key, &query_json, &body, state.config.search_cache_ttl())
                .await
            {
                tracing::warn!(error = %e, "search cache write failed");
            }
            body
        }
    };

    let response: SearchResponse =
        serde_json::from_str(&body).map_err(|e| Error::HttpError(format!("invalid search response: {e}")))?;
    if response.hit_count() == 0 {
        tracing::info!("Graph returned no hits");
        return Ok(SearchOutput::empty(NO_RESULTS_MESSAGE));
    }

    let files = response.hits(params.file_type);
    tracing::info!(count = files.len(), "Returning search results");
    Ok(SearchOutput { count: files.len(), files, message: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn graph_response() -> serde_json::Value {
        json!({
            "value": [{
                "hitsContainers": [{
                    "moreResultsAvailable": false,
                    "hits": [
                        {"rank": 1, "summary": "budget", "resource": {
                            "id": "x1", "name": "Budget.xlsx",
                            "webUrl": "https://contoso.sharepoint.com/sites/fin/Budget.xlsx",
                            "parentReference": {"driveId": "d1"}
                        }},
                        {"rank": 2, "summary": "budget", "resource": {
                            "id": "p1", "name": "Budget.pdf",
                            "webUrl": "https://contoso-my.sharepoint.com/personal/ada/Budget.pdf"
                        }}
                    ]
                }]
            }]
        })
    }

    fn params(query: &str, file_type: FileType) -> SearchParams {
        SearchParams { query: query.into(), file_type, max_results: 10, from: 0, force_refresh: false }
    }

    #[tokio::test]
    async fn test_spreadsheet_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(graph_response()))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_impl(&state, params("budget", FileType::Spreadsheet)).await.unwrap();
        assert_eq!(output.count, 1);
        assert_eq!(output.files[0].name, "Budget.xlsx");
        assert_eq!(output.files[0].drive_id.as_deref(), Some("d1"));
        assert!(output.message.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_skips_graph() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_impl(&state, params("   ", FileType::All)).await.unwrap();
        assert_eq!(output.count, 0);
        assert_eq!(output.message.as_deref(), Some(EMPTY_QUERY_MESSAGE));
    }

    #[tokio::test]
    async fn test_second_search_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(graph_response()))
            .expect(2)
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let first = search_impl(&state, params("budget", FileType::All)).await.unwrap();
        let second = search_impl(&state, params("budget", FileType::Document)).await.unwrap();
        assert_eq!(first.count, 2);
        assert_eq!(second.count, 1);
        assert_eq!(second.files[0].source, "OneDrive");

        let refreshed =
            search_impl(&state, SearchParams { force_refresh: true, ..params("budget", FileType::All) }).await.unwrap();
        assert_eq!(refreshed.count, 2);
    }

    #[tokio::test]
    async fn test_no_hits_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_impl(&state, params("nothing", FileType::All)).await.unwrap();
        assert_eq!(output.count, 0);
        assert_eq!(output.message.as_deref(), Some(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_filtered_out_hits_have_no_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(graph_response()))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let output = search_impl(&state, params("budget", FileType::Image)).await.unwrap();
        assert_eq!(output.count, 0);
        assert!(output.files.is_empty());
        assert!(output.message.is_none());
    }

    #[tokio::test]
    async fn test_graph_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("badRequest"))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let err = search_impl(&state, params("budget", FileType::All)).await.unwrap_err();
        assert!(matches!(err, Error::Graph { status: 400, .. }));
    }
}
