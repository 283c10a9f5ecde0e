//! Drive and content types shared across crates.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder text returned when no extractor produced output.
pub const NO_READABLE_TEXT: &str = "[No readable text found]";

/// Source tag for records produced by a format-specific fallback.
pub const SOURCE_MANUAL: &str = "manual";

/// Source tag for records produced by the general-purpose reader.
pub const SOURCE_READER: &str = "reader";

/// A file or folder node within a drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub is_folder: bool,
}

impl DriveItem {
    /// Whether the item name ends with `.{extension}`, ignoring case.
    ///
    /// A leading dot on `extension` is ignored, so `"xlsx"` and `".XLSX"` match
    /// the same names.
    pub fn has_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.');
        if ext.is_empty() {
            return true;
        }
        let name = self.name.to_lowercase();
        name.ends_with(&format!(".{}", ext.to_lowercase()))
    }
}

/// A block of text extracted from a downloaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentRecord {
    pub text: String,
    pub source: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContentRecord {
    /// A record produced by a format-specific fallback.
    pub fn manual(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: SOURCE_MANUAL.into(), metadata: BTreeMap::new() }
    }

    /// The sentinel returned when no extractor produced text.
    pub fn no_readable_text() -> Self {
        Self::manual(NO_READABLE_TEXT)
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.text == NO_READABLE_TEXT
    }
}

/// File category used to filter search hits by extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    All,
    Document,
    Spreadsheet,
    Presentation,
    Image,
}

impl FileType {
    /// Extensions belonging to the category; `None` means no filtering.
    pub fn extensions(&self) -> Option<&'static [&'static str]> {
        match self {
            FileType::All => None,
            FileType::Document => Some(&["docx", "doc", "txt", "pdf"]),
            FileType::Spreadsheet => Some(&["xlsx", "xls"]),
            FileType::Presentation => Some(&["pptx"]),
            FileType::Image => Some(&["jpg", "png"]),
        }
    }

    /// Whether a file name belongs to the category (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        let Some(extensions) = self.extensions() else {
            return true;
        };
        let name = name.to_lowercase();
        extensions.iter().any(|ext| name.ends_with(&format!(".{ext}")))
    }
}

/// One file returned by a Graph search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileHit {
    pub name: String,
    pub url: Option<String>,
    pub summary: String,
    pub rank: Option<i64>,
    /// `OneDrive` or `SharePoint`, derived from the web URL.
    pub source: String,
    pub created_by: serde_json::Value,
    pub created_date: Option<String>,
    pub last_modified_by: serde_json::Value,
    pub last_modified_date: Option<String>,
    pub fileid: Option<String>,
    pub parent_reference: serde_json::Value,
    pub drive_id: Option<String>,
}

/// Row window applied to spreadsheet extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowWindow {
    pub offset: usize,
    pub limit: usize,
}

impl RowWindow {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Exclusive end row of the window.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }
}

impl Default for RowWindow {
    fn default() -> Self {
        Self { offset: 0, limit: Self::DEFAULT_LIMIT }
    }
}
