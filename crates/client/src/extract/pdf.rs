//! PDF text, page by page.

use std::path::Path;

use lopdf::Document;
use m365_core::model::SOURCE_READER;
use m365_core::{ContentRecord, Error, RowWindow};

use super::{Extractor, extension_of, file_metadata};

/// Extracts the text layer of each page.
///
/// Records follow the general reader's shape: `source: "reader"`, file
/// metadata, and a 1-based `page_label`. Pages without text are skipped, so
/// scanned documents yield nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl Extractor for PdfReader {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("pdf")
    }

    fn extract(&self, path: &Path, _window: RowWindow) -> Result<Vec<ContentRecord>, Error> {
        let doc = Document::load(path).map_err(|e| Error::ExtractFailed(format!("{}: {e}", path.display())))?;
        let base = file_metadata(path);

        let mut records = Vec::new();
        for page in doc.get_pages().into_keys() {
            let text = match doc.extract_text(&[page]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(page, error = %e, "skipping unreadable PDF page");
                    continue;
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            let record = ContentRecord { text, source: SOURCE_READER.into(), metadata: base.clone() };
            records.push(record.with_meta("page_label", page.to_string()));
        }
        Ok(records)
    }
}
