//! General-purpose reader: plain-text files, word documents and presentations.

use std::path::Path;

use m365_core::model::SOURCE_READER;
use m365_core::{ContentRecord, Error, RowWindow};
use xml::reader::{EventReader, XmlEvent};

use super::{Extractor, docx, extension_of, file_metadata, open_archive, read_part, xml_error};

const PLAIN_TEXT: &[&str] = &["txt", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "log", "yaml", "yml"];

/// Reads plain-text formats and word documents whole, presentations slide
/// by slide.
///
/// Records are tagged `source: "reader"` and carry file metadata
/// (`file_path`, `file_name`, `file_type`, `file_size`, `last_modified_date`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReader;

impl Extractor for TextReader {
    fn name(&self) -> &'static str {
        "reader"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| ext == "pptx" || ext == "docx" || PLAIN_TEXT.contains(&ext.as_str()))
    }

    fn extract(&self, path: &Path, _window: RowWindow) -> Result<Vec<ContentRecord>, Error> {
        let texts = match extension_of(path).as_deref() {
            Some("pptx") => read_slides(path)?,
            Some("docx") => vec![(None, docx::document_text(path)?)],
            _ => {
                let bytes = std::fs::read(path).map_err(|e| Error::ExtractFailed(format!("{}: {e}", path.display())))?;
                vec![(None, String::from_utf8_lossy(&bytes).into_owned())]
            }
        };

        let base = file_metadata(path);
        Ok(texts
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(slide, text)| {
                let mut record = ContentRecord { text, source: SOURCE_READER.into(), metadata: base.clone() };
                if let Some(n) = slide {
                    record = record.with_meta("page_label", n.to_string());
                }
                record
            })
            .collect())
    }
}

/// Text of every slide, in slide order. Paragraphs become lines.
fn read_slides(path: &Path) -> Result<Vec<(Option<u32>, String)>, Error> {
    let mut archive = open_archive(path)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?.parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_unstable();

    let mut texts = Vec::with_capacity(slides.len());
    for (number, part) in slides {
        let Some(xml) = read_part(&mut archive, &part)? else {
            continue;
        };
        texts.push((Some(number), slide_text(&xml).map_err(|e| xml_error(&part, e))?));
    }
    Ok(texts)
}

/// `a:t` runs concatenated, one line per `a:p` paragraph.
fn slide_text(xml: &str) -> Result<String, xml::reader::Error> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut in_text = false;

    for event in EventReader::from_str(xml) {
        match event? {
            XmlEvent::StartElement { name, .. } if name.local_name == "t" => in_text = true,
            XmlEvent::EndElement { name } if name.local_name == "t" => in_text = false,
            XmlEvent::EndElement { name } if name.local_name == "p" => {
                if !line.trim().is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                line.clear();
            }
            XmlEvent::Characters(s) | XmlEvent::Whitespace(s) | XmlEvent::CData(s) if in_text => line.push_str(&s),
            _ => {}
        }
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
