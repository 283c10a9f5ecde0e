//! Graph `/search/query` request and response types.

use m365_core::cache::hash::compute_cache_key;
use m365_core::{Error, FileHit, FileType, Region};
use serde::Deserialize;
use serde_json::{Value, json};

/// Fields requested for every driveItem hit.
pub const SEARCH_FIELDS: &[&str] = &[
    "name",
    "webUrl",
    "id",
    "parentReference",
    "createdBy",
    "createdDateTime",
    "lastModifiedBy",
    "lastModifiedDateTime",
];

/// Largest page Graph accepts for driveItem searches.
pub const MAX_SEARCH_SIZE: u32 = 500;

/// A driveItem search across the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub from: u32,
    pub size: u32,
    pub region: Region,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, size: u32, region: Region) -> Self {
        Self { query: query.into(), from: 0, size, region }
    }

    /// Reject empty queries and page sizes Graph would refuse.
    pub fn validate(&self) -> Result<(), Error> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }
        if self.size == 0 || self.size > MAX_SEARCH_SIZE {
            return Err(Error::InvalidInput(format!("max_results must be 1-{MAX_SEARCH_SIZE}")));
        }
        Ok(())
    }

    /// JSON body for `POST /search/query`.
    pub fn to_body(&self) -> Value {
        json!({
            "requests": [{
                "entityTypes": ["driveItem"],
                "query": { "queryString": self.query },
                "fields": SEARCH_FIELDS,
                "from": self.from,
                "size": self.size,
                "region": self.region,
            }]
        })
    }

    /// Cache key over the normalized request.
    pub fn cache_key(&self) -> String {
        compute_cache_key(&[
            self.query.trim(),
            self.region.as_str(),
            &self.from.to_string(),
            &self.size.to_string(),
        ])
    }
}

/// Raw `/search/query` response.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    value: Vec<ResultSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSet {
    #[serde(default)]
    hits_containers: Vec<HitsContainer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitsContainer {
    #[serde(default)]
    hits: Vec<Hit>,
    #[serde(default)]
    more_results_available: bool,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(default)]
    rank: Option<i64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    resource: Resource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    parent_reference: Option<Value>,
    #[serde(default)]
    created_by: Option<Value>,
    #[serde(default)]
    created_date_time: Option<String>,
    #[serde(default)]
    last_modified_by: Option<Value>,
    #[serde(default)]
    last_modified_date_time: Option<String>,
}

impl SearchResponse {
    fn first_container(&self) -> Option<&HitsContainer> {
        self.value.first()?.hits_containers.first()
    }

    /// Number of hits Graph returned in the first container, before filtering.
    pub fn hit_count(&self) -> usize {
        self.first_container().map_or(0, |c| c.hits.len())
    }

    /// Hits of the first container whose names match `file_type`.
    ///
    /// Hits without a name are dropped.
    pub fn hits(&self, file_type: FileType) -> Vec<FileHit> {
        let Some(container) = self.first_container() else {
            return Vec::new();
        };

        container
            .hits
            .iter()
            .filter_map(|hit| {
                let resource = &hit.resource;
                let name = resource.name.as_deref().filter(|n| !n.is_empty())?;
                if !file_type.matches(name) {
                    return None;
                }

                let parent_reference = resource.parent_reference.clone().unwrap_or_else(|| json!({}));
                let drive_id = parent_reference.get("driveId").and_then(Value::as_str).map(str::to_string);

                Some(FileHit {
                    name: name.to_string(),
                    url: resource.web_url.clone(),
                    summary: hit.summary.clone().unwrap_or_default(),
                    rank: hit.rank,
                    source: classify_source(resource.web_url.as_deref().unwrap_or_default()).to_string(),
                    created_by: user_of(&resource.created_by),
                    created_date: resource.created_date_time.clone(),
                    last_modified_by: user_of(&resource.last_modified_by),
                    last_modified_date: resource.last_modified_date_time.clone(),
                    fileid: resource.id.clone(),
                    parent_reference,
                    drive_id,
                })
            })
            .collect()
    }

    /// Whether Graph reported more results beyond this page.
    pub fn more_results_available(&self) -> bool {
        self.first_container().is_some_and(|c| c.more_results_available)
    }
}

/// `{"user": {...}}` identity sets reduced to the user object.
fn user_of(identity: &Option<Value>) -> Value {
    identity
        .as_ref()
        .and_then(|v| v.get("user"))
        .cloned()
        .unwrap_or_else(|| json!({}))
}

/// Personal sites live under `my.sharepoint.com/personal/`.
pub fn classify_source(web_url: &str) -> &'static str {
    if web_url.contains("my.sharepoint.com/personal/") { "OneDrive" } else { "SharePoint" }
}
