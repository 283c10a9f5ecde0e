//! Text extraction from downloaded files.
//!
//! Extractors are tried in order; the first one that supports the file and
//! returns non-empty text wins. Failures are logged and fall through to the
//! next extractor.
//!
//! Default order:
//! 1. [`TextReader`]: plain-text formats, word documents and presentations
//!    (one record per slide)
//! 2. [`PdfReader`]: one record per page
//! 3. [`DocxReader`]: word-processor paragraphs
//! 4. [`XlsxReader`]: spreadsheet rows within a [`RowWindow`]

mod docx;
mod pdf;
mod text;
mod xlsx;

pub use docx::DocxReader;
pub use pdf::PdfReader;
pub use text::TextReader;
pub use xlsx::XlsxReader;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use m365_core::{ContentRecord, Error, RowWindow};
use serde_json::Value;
use zip::ZipArchive;

/// A format-specific text extractor.
///
/// Extraction is synchronous; callers run it on the blocking pool.
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this extractor understands the file, judged by its name.
    fn supports(&self, path: &Path) -> bool;

    /// Extract text records. An empty vector means nothing readable was found.
    fn extract(&self, path: &Path, window: RowWindow) -> Result<Vec<ContentRecord>, Error>;
}

/// Ordered list of extractors; first non-empty success wins.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new(vec![Box::new(TextReader), Box::new(PdfReader), Box::new(DocxReader), Box::new(XlsxReader)])
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.extractors.iter().map(|e| e.name()).collect();
        f.debug_struct("ExtractorChain").field("extractors", &names).finish()
    }
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Run the chain over `path`.
    ///
    /// Returns `None` when no extractor produced text.
    pub fn extract(&self, path: &Path, window: RowWindow) -> Option<Vec<ContentRecord>> {
        for extractor in self.extractors.iter().filter(|e| e.supports(path)) {
            match extractor.extract(path, window) {
                Ok(records) if has_text(&records) => {
                    tracing::debug!(extractor = extractor.name(), records = records.len(), "extracted text");
                    return Some(records);
                }
                Ok(_) => {
                    tracing::debug!(extractor = extractor.name(), path = %path.display(), "no text found");
                }
                Err(e) => {
                    tracing::warn!(extractor = extractor.name(), path = %path.display(), error = %e, "extractor failed, trying fallback");
                }
            }
        }
        None
    }
}

fn has_text(records: &[ContentRecord]) -> bool {
    records.iter().any(|r| !r.text.trim().is_empty())
}

/// Lowercased file extension without the dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

/// Metadata attached to general reader records.
pub(crate) fn file_metadata(path: &Path) -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    meta.insert("file_path".into(), Value::from(path.display().to_string()));
    if let Some(name) = path.file_name() {
        meta.insert("file_name".into(), Value::from(name.to_string_lossy().into_owned()));
    }
    meta.insert("file_type".into(), Value::from(extension_of(path).unwrap_or_default()));

    if let Ok(stat) = std::fs::metadata(path) {
        meta.insert("file_size".into(), Value::from(stat.len()));
        if let Ok(modified) = stat.modified() {
            let modified: DateTime<Utc> = modified.into();
            meta.insert("last_modified_date".into(), Value::from(modified.format("%Y-%m-%d").to_string()));
        }
    }
    meta
}

pub(crate) fn open_archive(path: &Path) -> Result<ZipArchive<File>, Error> {
    let file = File::open(path).map_err(|e| Error::ExtractFailed(format!("{}: {e}", path.display())))?;
    ZipArchive::new(file).map_err(|e| Error::ExtractFailed(format!("{}: not an OOXML package: {e}", path.display())))
}

/// Read a package part as UTF-8. Missing parts yield `None`.
pub(crate) fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, Error> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(Error::ExtractFailed(format!("{name}: {e}"))),
    };
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::ExtractFailed(format!("{name}: {e}")))?;
    Ok(Some(xml))
}

pub(crate) fn xml_error(part: &str, err: xml::reader::Error) -> Error {
    Error::ExtractFailed(format!("{part}: malformed XML: {err}"))
}
