//! crawl_drive: list every file in a drive, optionally by extension.

use m365_core::{DriveItem, Error};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for crawl_drive.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlParams {
    /// Drive to crawl.
    pub driveid: String,

    /// Only return files ending in `.{file_extension}` (case-insensitive).
    #[serde(default)]
    pub file_extension: Option<String>,

    /// Start from this folder instead of the drive root.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Output of crawl_drive.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrawlOutput {
    pub count: usize,
    pub files: Vec<DriveItem>,
}

pub async fn crawl_impl(state: &AppState, params: CrawlParams) -> Result<CrawlOutput, Error> {
    let files = state
        .crawler
        .crawl(&params.driveid, params.parent_id.as_deref(), params.file_extension.as_deref())
        .await?;
    Ok(CrawlOutput { count: files.len(), files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_crawl_counts_filtered_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drives/d1/root/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [
                {"id": "1", "name": "a.xlsx", "file": {}},
                {"id": "2", "name": "b.docx", "file": {}}
            ]})))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::state(&server, tmp.path()).await;

        let params = CrawlParams { driveid: "d1".into(), file_extension: Some("xlsx".into()), parent_id: None };
        let output = crawl_impl(&state, params).await.unwrap();
        assert_eq!(output.count, 1);
        assert_eq!(output.files[0].name, "a.xlsx");

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["files"][0]["driveId"], "d1");
        assert_eq!(json["files"][0]["isFolder"], false);
    }
}
