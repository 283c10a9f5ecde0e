//! Word-processor fallback: body paragraphs joined by newlines.

use std::path::Path;

use m365_core::{ContentRecord, Error, RowWindow};
use xml::reader::{EventReader, XmlEvent};

use super::{Extractor, extension_of, open_archive, read_part, xml_error};

pub(super) const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Default, Clone, Copy)]
pub struct DocxReader;

impl Extractor for DocxReader {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("docx")
    }

    fn extract(&self, path: &Path, _window: RowWindow) -> Result<Vec<ContentRecord>, Error> {
        let text = document_text(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ContentRecord::manual(text)])
    }
}

/// Body paragraphs of a word-processing package, joined by newlines.
pub(super) fn document_text(path: &Path) -> Result<String, Error> {
    let mut archive = open_archive(path)?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| Error::ExtractFailed(format!("{}: missing {DOCUMENT_PART}", path.display())))?;

    let paragraphs = paragraphs(&xml).map_err(|e| xml_error(DOCUMENT_PART, e))?;
    Ok(paragraphs.join("\n"))
}

/// Text of every `w:p`, empty paragraphs included.
fn paragraphs(xml: &str) -> Result<Vec<String>, xml::reader::Error> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    for event in EventReader::from_str(xml) {
        match event? {
            XmlEvent::StartElement { name, .. } => match name.local_name.as_str() {
                "t" => in_text = true,
                "tab" => current.push('\t'),
                "br" | "cr" => current.push('\n'),
                _ => {}
            },
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "t" => in_text = false,
                "p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            XmlEvent::Characters(s) | XmlEvent::Whitespace(s) | XmlEvent::CData(s) if in_text => current.push_str(&s),
            _ => {}
        }
    }
    Ok(paragraphs)
}
