//! Drive item and site payloads.

use m365_core::DriveItem;
use serde::Deserialize;
use serde_json::Value;

/// One page of `/children` (or search) results.
#[derive(Debug, Default, Deserialize)]
pub struct ItemPage {
    #[serde(default)]
    pub value: Vec<RemoteItem>,
    /// Continuation link; absent on the last page.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// A driveItem as Graph returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub parent_reference: Option<ParentReference>,
    #[serde(default)]
    pub file: Option<Value>,
    #[serde(default)]
    pub folder: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl RemoteItem {
    /// Items carrying a `file` facet.
    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    /// Items carrying a `folder` facet.
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn drive_id(&self) -> Option<&str> {
        self.parent_reference.as_ref()?.drive_id.as_deref()
    }
}

impl From<RemoteItem> for DriveItem {
    fn from(item: RemoteItem) -> Self {
        let is_folder = item.is_folder();
        let drive_id = item.drive_id().map(str::to_string);
        DriveItem {
            id: item.id,
            name: item.name.unwrap_or_default(),
            web_url: item.web_url,
            drive_id,
            is_folder,
        }
    }
}

/// A SharePoint site as returned by `/sites/{hostname}:{path}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}
