//! get_file_content: download a drive item and return its extracted text.

use m365_core::{ContentRecord, Error, RowWindow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for get_file_content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileContentParams {
    /// Drive id (the `drive_id` of a search hit).
    pub driveid: String,

    /// Item id (the `fileid` of a search hit).
    pub fileid: String,

    /// First spreadsheet row to return (default: 0).
    #[serde(default)]
    pub offset: usize,

    /// Spreadsheet rows per sheet (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    RowWindow::DEFAULT_LIMIT
}

/// Output of get_file_content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileContentOutput {
    pub content: Vec<ContentRecord>,
}

impl FileContentOutput {
    /// Text of the first record, as returned by the HTTP route.
    pub fn first_text(&self) -> &str {
        self.content.first().map(|r| r.text.as_str()).unwrap_or_default()
    }
}

pub async fn file_content_impl(state: &AppState, params: FileContentParams) -> Result<FileContentOutput, Error> {
    tracing::info!(driveid = %params.driveid, fileid = %params.fileid, offset = params.offset, limit = params.limit, "get_file_content invoked");

    if params.limit == 0 {
        return Err(Error::InvalidInput("limit must be at least 1".into()));
    }

    let window = RowWindow::new(params.offset, params.limit);
    let content = state.downloads.fetch(&params.driveid, &params.fileid, window).await?;
    Ok(FileContentOutput { content })
}
