//! Spreadsheet fallback: sheet by sheet, row by row.
//!
//! Reads the SpreadsheetML parts directly:
//!
//! ```text
//! xl/workbook.xml              sheet names and relationship ids, in tab order
//! xl/_rels/workbook.xml.rels   relationship id -> worksheet part
//! xl/sharedStrings.xml         string table referenced by t="s" cells
//! xl/styles.xml                number formats, to spot date cells
//! xl/worksheets/sheetN.xml     rows of cells
//! ```
//!
//! Rows are rendered from row 1 and column A up to the last used cell, with
//! `" | "` between cells. Each sheet honors the same row window; a sheet with
//! rows beyond the window ends with a continuation hint.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use m365_core::{ContentRecord, Error, RowWindow};
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};
use zip::ZipArchive;

use super::{Extractor, extension_of, open_archive, read_part, xml_error};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// Last column a worksheet may use (`XFD`), 0-based.
const MAX_COLUMN: u32 = 16_383;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReader;

impl Extractor for XlsxReader {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("xlsx")
    }

    fn extract(&self, path: &Path, window: RowWindow) -> Result<Vec<ContentRecord>, Error> {
        let mut archive = open_archive(path)?;

        let workbook = workbook(&mut archive)?;
        let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => shared_strings(&xml).map_err(|e| xml_error(SHARED_STRINGS_PART, e))?,
            None => Vec::new(),
        };
        let formats = CellFormats {
            dates: match read_part(&mut archive, STYLES_PART)? {
                Some(xml) => date_styles(&xml).map_err(|e| xml_error(STYLES_PART, e))?,
                None => Vec::new(),
            },
            date1904: workbook.date1904,
        };

        let mut chunks = Vec::new();
        for sheet in workbook.sheets {
            chunks.push(format!("--- Sheet: {} ---", sheet.name));
            let Some(xml) = read_part(&mut archive, &sheet.part)? else {
                tracing::warn!(sheet = %sheet.name, part = %sheet.part, "worksheet part missing");
                continue;
            };
            let rows = sheet_rows(&xml, &shared, &formats).map_err(|e| xml_error(&sheet.part, e))?;
            render_window(&rows, window, &mut chunks);
        }

        let text = chunks.join("\n");
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ContentRecord::manual(text)])
    }
}

struct Workbook {
    sheets: Vec<SheetRef>,
    date1904: bool,
}

struct SheetRef {
    name: String,
    part: String,
}

/// Which cell styles carry a date format, and the workbook's date epoch.
#[derive(Default)]
struct CellFormats {
    /// Indexed by the cell's `s` attribute (position in `cellXfs`).
    dates: Vec<bool>,
    date1904: bool,
}

impl CellFormats {
    fn is_date(&self, style: Option<usize>) -> bool {
        style.and_then(|s| self.dates.get(s)).copied().unwrap_or(false)
    }
}

/// A used row: its 1-based index and its cells by 0-based column.
type Row = (u32, BTreeMap<u32, String>);

fn render_window(rows: &[Row], window: RowWindow, chunks: &mut Vec<String>) {
    let Some(last_row) = rows.iter().map(|r| r.0).max() else {
        return;
    };
    let last_col = rows.iter().filter_map(|(_, cells)| cells.keys().next_back()).max().copied().unwrap_or(0);

    let by_index: HashMap<u32, &BTreeMap<u32, String>> = rows.iter().map(|(i, cells)| (*i, cells)).collect();

    for row_index in (1..=last_row).skip(window.offset).take(window.limit) {
        let cells = by_index.get(&row_index);
        let line: Vec<&str> = (0..=last_col)
            .map(|col| cells.and_then(|c| c.get(&col)).map(String::as_str).unwrap_or(""))
            .collect();
        chunks.push(line.join(" | "));
    }
    if last_row as usize > window.end() {
        chunks.push(format!(
            "[... {} rows shown. Use offset={} to continue ...]",
            window.limit,
            window.end()
        ));
    }
}

fn attr<'a>(attributes: &'a [OwnedAttribute], local_name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name.local_name == local_name)
        .map(|a| a.value.as_str())
}

/// Sheets in tab order with their resolved worksheet part names.
fn workbook(archive: &mut ZipArchive<File>) -> Result<Workbook, Error> {
    let xml = read_part(archive, WORKBOOK_PART)?
        .ok_or_else(|| Error::ExtractFailed(format!("missing {WORKBOOK_PART}")))?;
    let rels = read_part(archive, WORKBOOK_RELS_PART)?.unwrap_or_default();

    let mut targets = HashMap::new();
    if !rels.is_empty() {
        for event in EventReader::from_str(&rels) {
            if let XmlEvent::StartElement { name, attributes, .. } = event.map_err(|e| xml_error(WORKBOOK_RELS_PART, e))?
                && name.local_name == "Relationship"
                && let (Some(id), Some(target)) = (attr(&attributes, "Id"), attr(&attributes, "Target"))
            {
                targets.insert(id.to_string(), resolve_target(target));
            }
        }
    }

    let mut workbook = Workbook { sheets: Vec::new(), date1904: false };
    for event in EventReader::from_str(&xml) {
        let XmlEvent::StartElement { name, attributes, .. } = event.map_err(|e| xml_error(WORKBOOK_PART, e))? else {
            continue;
        };
        match name.local_name.as_str() {
            "workbookPr" => {
                workbook.date1904 = matches!(attr(&attributes, "date1904"), Some("1" | "true"));
            }
            "sheet" => {
                let sheet_name = attr(&attributes, "name").unwrap_or_default().to_string();
                let rel_id = attributes
                    .iter()
                    .find(|a| a.name.local_name == "id" && a.name.prefix.is_some())
                    .map(|a| a.value.as_str());
                let part = rel_id
                    .and_then(|id| targets.get(id).cloned())
                    .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", workbook.sheets.len() + 1));
                workbook.sheets.push(SheetRef { name: sheet_name, part });
            }
            _ => {}
        }
    }
    Ok(workbook)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Shared string table; rich-text runs are concatenated, phonetic hints skipped.
fn shared_strings(xml: &str) -> Result<Vec<String>, xml::reader::Error> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    for event in EventReader::from_str(xml) {
        match event? {
            XmlEvent::StartElement { name, .. } => match name.local_name.as_str() {
                "si" => current.clear(),
                "t" => in_text = true,
                "rPh" => in_phonetic = true,
                _ => {}
            },
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "si" => strings.push(std::mem::take(&mut current)),
                "t" => in_text = false,
                "rPh" => in_phonetic = false,
                _ => {}
            },
            XmlEvent::Characters(s) | XmlEvent::Whitespace(s) | XmlEvent::CData(s) if in_text && !in_phonetic => {
                current.push_str(&s);
            }
            _ => {}
        }
    }
    Ok(strings)
}

/// For each `cellXfs` entry, whether its number format shows a date or time.
///
/// Custom `numFmt` codes precede `cellXfs` in the part, so they are known by
/// the time the cell formats are read.
fn date_styles(xml: &str) -> Result<Vec<bool>, xml::reader::Error> {
    let mut custom: HashMap<u32, bool> = HashMap::new();
    let mut styles = Vec::new();
    let mut in_cell_xfs = false;

    for event in EventReader::from_str(xml) {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => match name.local_name.as_str() {
                "numFmt" => {
                    if let (Some(id), Some(code)) =
                        (attr(&attributes, "numFmtId").and_then(|v| v.parse().ok()), attr(&attributes, "formatCode"))
                    {
                        custom.insert(id, is_date_format(code));
                    }
                }
                "cellXfs" => in_cell_xfs = true,
                "xf" if in_cell_xfs => {
                    let id: u32 = attr(&attributes, "numFmtId").and_then(|v| v.parse().ok()).unwrap_or(0);
                    styles.push(custom.get(&id).copied().unwrap_or_else(|| is_builtin_date(id)));
                }
                _ => {}
            },
            XmlEvent::EndElement { name } if name.local_name == "cellXfs" => in_cell_xfs = false,
            _ => {}
        }
    }
    Ok(styles)
}

/// Built-in formats 14-22 (dates and times) and 45-47 (elapsed times).
fn is_builtin_date(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Whether a custom format code contains date or time tokens.
///
/// Only the positive section counts. Quoted literals, bracketed colors and
/// conditions, and backslash escapes are skipped.
fn is_date_format(code: &str) -> bool {
    let section = code.split(';').next().unwrap_or_default();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                chars.by_ref().find(|&c| c == '"');
            }
            '[' => {
                chars.by_ref().find(|&c| c == ']');
            }
            '\\' => {
                chars.next();
            }
            c if matches!(c.to_ascii_lowercase(), 'd' | 'm' | 'y' | 'h' | 's') => return true,
            _ => {}
        }
    }
    false
}

/// Render a date-formatted serial number as `YYYY-MM-DD HH:MM:SS`, or
/// `HH:MM:SS` for a pure time below one day.
///
/// Uses the 1900 system (epoch 1899-12-30, serials below 60 shifted for the
/// phantom 1900-02-29) unless the workbook is in the 1904 system.
fn excel_datetime(serial: f64, date1904: bool) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as u64;
    let mut days = millis / 86_400_000;
    let ms = millis % 86_400_000;
    let time = NaiveTime::from_num_seconds_from_midnight_opt((ms / 1000) as u32, ((ms % 1000) * 1_000_000) as u32)?;

    if days == 0 {
        return Some(with_fraction(time.format("%H:%M:%S").to_string(), time.nanosecond()));
    }
    if !date1904 && serial < 60.0 {
        days += 1;
    }
    let epoch = if date1904 { NaiveDate::from_ymd_opt(1904, 1, 1)? } else { NaiveDate::from_ymd_opt(1899, 12, 30)? };
    let stamp = NaiveDateTime::new(epoch.checked_add_days(Days::new(days))?, time);
    Some(with_fraction(stamp.format("%Y-%m-%d %H:%M:%S").to_string(), time.nanosecond()))
}

fn with_fraction(mut text: String, nanos: u32) -> String {
    if nanos > 0 {
        text.push_str(&format!(".{:06}", nanos / 1000));
    }
    text
}

#[derive(Default)]
struct Cell {
    column: Option<u32>,
    style: Option<usize>,
    kind: String,
    value: String,
    inline: String,
}

impl Cell {
    fn render(self, shared: &[String], formats: &CellFormats) -> String {
        match self.kind.as_str() {
            "s" => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i).cloned())
                .unwrap_or_default(),
            "inlineStr" => self.inline,
            "b" => match self.value.trim() {
                "1" => "TRUE".to_string(),
                "0" => "FALSE".to_string(),
                other => other.to_string(),
            },
            "n" if formats.is_date(self.style) => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|serial| excel_datetime(serial, formats.date1904))
                .unwrap_or(self.value),
            _ => self.value,
        }
    }
}

/// Non-empty rows in document order.
fn sheet_rows(xml: &str, shared: &[String], formats: &CellFormats) -> Result<Vec<Row>, xml::reader::Error> {
    let mut rows: Vec<Row> = Vec::new();
    let mut row_index = 0u32;
    let mut cells = BTreeMap::new();
    let mut next_column = 0u32;
    let mut cell: Option<Cell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    for event in EventReader::from_str(xml) {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => match name.local_name.as_str() {
                "row" => {
                    row_index = attr(&attributes, "r")
                        .and_then(|r| r.parse().ok())
                        .unwrap_or_else(|| row_index.saturating_add(1));
                    cells = BTreeMap::new();
                    next_column = 0;
                }
                "c" => {
                    cell = Some(Cell {
                        column: attr(&attributes, "r").and_then(column_index),
                        style: attr(&attributes, "s").and_then(|s| s.parse().ok()),
                        kind: attr(&attributes, "t").unwrap_or("n").to_string(),
                        ..Default::default()
                    });
                }
                "v" => in_value = true,
                "t" => in_inline_text = true,
                _ => {}
            },
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "v" => in_value = false,
                "t" => in_inline_text = false,
                "c" => {
                    if let Some(done) = cell.take() {
                        let column = done.column.unwrap_or(next_column);
                        next_column = column.saturating_add(1);
                        let text = done.render(shared, formats);
                        if !text.is_empty() && column <= MAX_COLUMN {
                            cells.insert(column, text);
                        }
                    }
                }
                "row" => {
                    if !cells.is_empty() {
                        rows.push((row_index, std::mem::take(&mut cells)));
                    }
                }
                _ => {}
            },
            XmlEvent::Characters(s) | XmlEvent::Whitespace(s) | XmlEvent::CData(s) => {
                if let Some(c) = cell.as_mut() {
                    if in_value {
                        c.value.push_str(&s);
                    } else if in_inline_text {
                        c.inline.push_str(&s);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(rows)
}

/// 0-based column of an `A1`-style reference; `None` past `XFD`.
fn column_index(reference: &str) -> Option<u32> {
    let letters: String = reference.chars().take_while(char::is_ascii_alphabetic).collect();
    if letters.is_empty() {
        return None;
    }
    let n = letters.chars().try_fold(0u32, |acc, c| {
        acc.checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
    })?;
    Some(n - 1).filter(|&index| index <= MAX_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures::write_package;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Budget" sheetId="1" r:id="rId1"/>
    <sheet name="Notes" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet1.xml"/>
</Relationships>"#;

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Item</t></si>
  <si><t>Cost</t></si>
  <si><r><t>Rent</t></r><r><t xml:space="preserve"> (HQ)</t></r><rPh><t>x</t></rPh></si>
</sst>"#;

    fn sheet(rows: &[&str]) -> String {
        format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            rows.concat()
        )
    }

    fn numbered_rows(count: u32) -> Vec<String> {
        (1..=count)
            .map(|r| format!(r#"<row r="{r}"><c r="A{r}"><v>{r}</v></c></row>"#))
            .collect()
    }

    fn write_workbook(dir: &Path, sheet1: &str, sheet2: &str) -> std::path::PathBuf {
        let path = dir.join("Budget.xlsx");
        write_package(
            &path,
            &[
                (WORKBOOK_PART, WORKBOOK),
                (WORKBOOK_RELS_PART, RELS),
                (SHARED_STRINGS_PART, SHARED),
                ("xl/worksheets/sheet1.xml", sheet1),
                ("xl/worksheets/sheet2.xml", sheet2),
            ],
        );
        path
    }

    #[test]
    fn test_sheets_and_cells() {
        let tmp = tempfile::tempdir().unwrap();
        let sheet1 = sheet(&[
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#,
            r#"<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>1200.5</v></c></row>"#,
            r#"<row r="4"><c r="B4"><v>0</v></c><c r="C4" t="b"><v>1</v></c></row>"#,
        ]);
        let sheet2 = sheet(&[r#"<row r="1"><c r="A1" t="inlineStr"><is><t>see HR</t></is></c></row>"#]);
        let path = write_workbook(tmp.path(), &sheet1, &sheet2);

        let records = XlsxReader.extract(&path, RowWindow::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "manual");
        assert_eq!(
            records[0].text,
            [
                "--- Sheet: Budget ---",
                "Item | Cost | ",
                "Rent (HQ) | 1200.5 | ",
                " |  | ",
                " | 0 | TRUE",
                "--- Sheet: Notes ---",
                "see HR",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_row_window_and_hint() {
        let tmp = tempfile::tempdir().unwrap();
        let rows = numbered_rows(5);
        let sheet1 = sheet(&rows.iter().map(String::as_str).collect::<Vec<_>>());
        let sheet2 = sheet(&[r#"<row r="1"><c r="A1"><v>only</v></c></row>"#]);
        let path = write_workbook(tmp.path(), &sheet1, &sheet2);

        let records = XlsxReader.extract(&path, RowWindow::new(1, 2)).unwrap();
        assert_eq!(
            records[0].text,
            [
                "--- Sheet: Budget ---",
                "2",
                "3",
                "[... 2 rows shown. Use offset=3 to continue ...]",
                "--- Sheet: Notes ---",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_last_window_has_no_hint() {
        let tmp = tempfile::tempdir().unwrap();
        let rows = numbered_rows(3);
        let sheet1 = sheet(&rows.iter().map(String::as_str).collect::<Vec<_>>());
        let path = write_workbook(tmp.path(), &sheet1, &sheet(&[]));

        let records = XlsxReader.extract(&path, RowWindow::new(2, 50)).unwrap();
        assert_eq!(records[0].text, "--- Sheet: Budget ---\n3\n--- Sheet: Notes ---");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("XFD1"), Some(MAX_COLUMN));
        assert_eq!(column_index("XFE1"), None);
        assert_eq!(column_index("ZZZZZZZZ1"), None);
    }

    #[test]
    fn test_oversized_column_reference_still_extracts() {
        let tmp = tempfile::tempdir().unwrap();
        let sheet1 = sheet(&[r#"<row r="1"><c r="ZZZZZZZZ1"><v>7</v></c><c r="B1"><v>8</v></c></row>"#]);
        let path = write_workbook(tmp.path(), &sheet1, &sheet(&[]));

        let records = XlsxReader.extract(&path, RowWindow::default()).unwrap();
        assert_eq!(records[0].text, "--- Sheet: Budget ---\n7 | 8\n--- Sheet: Notes ---");
    }

    #[test]
    fn test_rows_and_columns_count_from_a1() {
        let tmp = tempfile::tempdir().unwrap();
        let sheet1 = sheet(&[
            r#"<row r="3"><c r="B3"><v>10</v></c></row>"#,
            r#"<row r="4"><c r="B4"><v>20</v></c></row>"#,
        ]);
        let path = write_workbook(tmp.path(), &sheet1, &sheet(&[]));

        let first = XlsxReader.extract(&path, RowWindow::new(0, 2)).unwrap();
        assert_eq!(
            first[0].text,
            [
                "--- Sheet: Budget ---",
                " | ",
                " | ",
                "[... 2 rows shown. Use offset=2 to continue ...]",
                "--- Sheet: Notes ---",
            ]
            .join("\n")
        );

        let second = XlsxReader.extract(&path, RowWindow::new(2, 2)).unwrap();
        assert_eq!(second[0].text, "--- Sheet: Budget ---\n | 10\n | 20\n--- Sheet: Notes ---");
    }

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts>
  <cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs>
  <cellXfs count="4"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/><xf numFmtId="4"/></cellXfs>
</styleSheet>"#;

    #[test]
    fn test_date_formatted_cells() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Dates.xlsx");
        let sheet1 = sheet(&[
            r#"<row r="1"><c r="A1" s="1"><v>45292</v></c><c r="B1" s="2"><v>45292.75</v></c><c r="C1" s="3"><v>1234.5</v></c></row>"#,
            r#"<row r="2"><c r="A2" s="1"><v>0.5</v></c><c r="B2" s="1"><v>1</v></c><c r="C2" s="0"><v>45292</v></c></row>"#,
        ]);
        write_package(
            &path,
            &[
                (WORKBOOK_PART, WORKBOOK),
                (WORKBOOK_RELS_PART, RELS),
                (STYLES_PART, STYLES),
                ("xl/worksheets/sheet1.xml", &sheet1),
                ("xl/worksheets/sheet2.xml", &sheet(&[])),
            ],
        );

        let records = XlsxReader.extract(&path, RowWindow::default()).unwrap();
        assert_eq!(
            records[0].text,
            [
                "--- Sheet: Budget ---",
                "2024-01-01 00:00:00 | 2024-01-01 18:00:00 | 1234.5",
                "12:00:00 | 1900-01-01 00:00:00 | 45292",
                "--- Sheet: Notes ---",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("h:mm AM/PM"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("[Red]0.00"));
        assert!(!is_date_format(r#""days "0"#));
        assert!(!is_date_format(r"0\d"));
    }

    #[test]
    fn test_excel_datetime_epochs() {
        assert_eq!(excel_datetime(45292.0, false).as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(excel_datetime(1.0, true).as_deref(), Some("1904-01-02 00:00:00"));
        assert_eq!(excel_datetime(0.25, false).as_deref(), Some("06:00:00"));
        assert_eq!(excel_datetime(-1.0, false), None);
        assert_eq!(excel_datetime(1e300, false), None);
    }

    #[test]
    fn test_not_a_workbook() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fake.xlsx");
        write_package(&path, &[("hello.txt", "hi")]);
        assert!(XlsxReader.extract(&path, RowWindow::default()).is_err());
    }
}
