//! XLSX workbook reader implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use receipt_core::{CellValue, Error, RawTable, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::sync::LazyLock;
use zip::ZipArchive;

/// Sheet holding the donation ledger in accounting exports.
pub const DEFAULT_SHEET_NAME: &str = "Donation";

/// Title rows above the header row in accounting exports.
pub const DEFAULT_HEADER_ROW: usize = 10;

/// Regex splitting an A1-style cell reference into column letters and row.
static CELL_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?(\d+)$").unwrap());

/// A sheet entry from the workbook, resolved to its part path.
#[derive(Debug, Clone, PartialEq)]
struct SheetEntry {
    name: String,
    path: String,
}

/// Cells of one sheet, keyed by 1-based row number then 0-based column.
#[derive(Debug, Default)]
struct SheetGrid {
    rows: BTreeMap<usize, BTreeMap<usize, CellValue>>,
}

/// Reader for XLSX (Office Open XML) ledger workbooks.
#[derive(Debug, Clone)]
pub struct XlsxReader {
    sheet_name: String,
    header_row: usize,
}

impl XlsxReader {
    /// Create a reader for the "Donation" sheet with 10 title rows.
    pub fn new() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            header_row: DEFAULT_HEADER_ROW,
        }
    }

    /// Read a different sheet.
    pub fn with_sheet(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Number of sheet rows before the header row.
    pub fn with_header_row(mut self, rows_before_header: usize) -> Self {
        self.header_row = rows_before_header;
        self
    }

    /// Read the configured sheet into a raw table.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<RawTable> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open workbook: {}", e)))?;

        let sheets = self.workbook_sheets(&mut archive)?;
        let sheet = sheets
            .iter()
            .find(|s| s.name == self.sheet_name)
            .ok_or_else(|| {
                Error::XlsxParseError(format!(
                    "Worksheet named '{}' not found (available: {})",
                    self.sheet_name,
                    sheets
                        .iter()
                        .map(|s| s.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
        log::debug!("Reading sheet '{}' from {}", sheet.name, sheet.path);

        let shared = self.shared_strings(&mut archive)?;
        let content = self.read_file_from_archive(&mut archive, &sheet.path)?;
        let grid = self.parse_sheet(&content, &shared)?;

        self.grid_to_table(grid)
    }

    /// Names of all sheets in workbook order.
    pub fn sheet_names<R: Read + Seek>(&self, reader: R) -> Result<Vec<String>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open workbook: {}", e)))?;

        Ok(self
            .workbook_sheets(&mut archive)?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    /// Resolve sheet names to part paths via the workbook relationships.
    fn workbook_sheets<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<SheetEntry>> {
        let rels_content = self.read_file_from_archive(archive, "xl/_rels/workbook.xml.rels")?;
        let mut targets: BTreeMap<String, String> = BTreeMap::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let id = attribute(e, b"Id").unwrap_or_default();
                    let target = attribute(e, b"Target").unwrap_or_default();
                    let full_path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    };
                    targets.insert(id, full_path);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing workbook relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        let workbook_content = self.read_file_from_archive(archive, "xl/workbook.xml")?;
        let mut reader = Reader::from_str(&workbook_content);
        reader.trim_text(true);
        let mut sheets = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"sheet" => {
                            let name = attribute(e, b"name").unwrap_or_default();
                            let path = attribute(e, b"id").and_then(|id| targets.get(&id).cloned());
                            match path {
                                Some(path) => sheets.push(SheetEntry { name, path }),
                                None => log::warn!("Sheet '{}' has no worksheet part", name),
                            }
                        }
                        b"workbookPr" => {
                            if matches!(attribute(e, b"date1904").as_deref(), Some("1" | "true")) {
                                log::warn!(
                                    "Workbook uses the 1904 date system; serial dates will read four years early"
                                );
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing workbook: {}", e)));
                }
                _ => {}
            }
        }

        Ok(sheets)
    }

    /// Read the shared string table. Workbooks without one have no shared strings.
    fn shared_strings<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        if archive.by_name("xl/sharedStrings.xml").is_err() {
            return Ok(Vec::new());
        }
        let content = self.read_file_from_archive(archive, "xl/sharedStrings.xml")?;

        let mut reader = Reader::from_str(&content);
        // Runs may begin or end with significant spaces.
        reader.trim_text(false);

        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"si" => current.clear(),
                    b"rPh" => phonetic_depth += 1,
                    b"t" if phonetic_depth == 0 => in_text = true,
                    _ => {}
                },
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        current.push_str(&e.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"si" => strings.push(std::mem::take(&mut current)),
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if local_name(e.name().as_ref()) == b"si" {
                        strings.push(String::new());
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing shared strings: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        log::debug!("Loaded {} shared strings", strings.len());
        Ok(strings)
    }

    /// Collect every cell of a worksheet part.
    fn parse_sheet(&self, xml_content: &str, shared: &[String]) -> Result<SheetGrid> {
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(false);

        let mut grid = SheetGrid::default();
        let mut row_number = 0usize;
        let mut next_column = 0usize;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"row" => {
                        row_number = row_attribute(e).unwrap_or(row_number + 1);
                        next_column = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::start(e, row_number, next_column);
                        next_column = pending.column + 1;
                        cell = Some(pending);
                    }
                    b"v" => in_value = true,
                    b"t" if cell.is_some() => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                    b"row" => {
                        row_number = row_attribute(e).unwrap_or(row_number + 1);
                        next_column = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::start(e, row_number, next_column);
                        next_column = pending.column + 1;
                    }
                    _ => {}
                },
                Ok(Event::Text(ref e)) => {
                    if let Some(ref mut pending) = cell {
                        if in_value {
                            pending.value.push_str(&e.unescape().unwrap_or_default());
                        } else if in_inline_text {
                            pending.inline.push_str(&e.unescape().unwrap_or_default());
                        }
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let (row, column) = (pending.row, pending.column);
                            let value = pending.finish(shared);
                            if !value.is_empty() {
                                grid.rows.entry(row).or_default().insert(column, value);
                            }
                        }
                        in_value = false;
                        in_inline_text = false;
                    }
                    b"v" => in_value = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing worksheet: {}", e)));
                }
                _ => {}
            }
        }

        Ok(grid)
    }

    /// Cut the grid at the header row and align data rows to its columns.
    fn grid_to_table(&self, grid: SheetGrid) -> Result<RawTable> {
        // Counted from the sheet's first row, whether or not leading rows are blank.
        let header_number = self.header_row + 1;

        let header = grid.rows.get(&header_number).ok_or_else(|| {
            Error::XlsxParseError(format!(
                "Sheet '{}' has no header row at row {}",
                self.sheet_name, header_number
            ))
        })?;

        let width = header.keys().next_back().map(|c| c + 1).unwrap_or(0);
        let columns: Vec<String> = (0..width)
            .map(|c| match header.get(&c) {
                Some(value) if !value.is_empty() => value.to_text(),
                _ => format!("Unnamed: {}", c),
            })
            .collect();
        log::debug!("Header at row {}: {:?}", header_number, columns);

        let mut table = RawTable::new(columns);
        for (_, cells) in grid.rows.range(header_number + 1..) {
            let row: Vec<CellValue> = (0..width)
                .map(|c| cells.get(&c).cloned().unwrap_or_default())
                .collect();
            table.push_row(row);
        }

        Ok(table)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for XlsxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// A `<c>` element being read.
#[derive(Debug)]
struct PendingCell {
    row: usize,
    column: usize,
    kind: Option<String>,
    value: String,
    inline: String,
}

impl PendingCell {
    fn start(e: &BytesStart<'_>, row: usize, next_column: usize) -> Self {
        let position = attribute(e, b"r").and_then(|r| parse_cell_ref(&r));
        let (row, column) = match position {
            Some((column, row)) => (row, column),
            None => (row, next_column),
        };

        Self {
            row,
            column,
            kind: attribute(e, b"t"),
            value: String::new(),
            inline: String::new(),
        }
    }

    fn finish(self, shared: &[String]) -> CellValue {
        match self.kind.as_deref() {
            Some("s") => match self.value.trim().parse::<usize>().ok().and_then(|i| shared.get(i)) {
                Some(text) => CellValue::Text(text.clone()),
                None => {
                    log::warn!(
                        "Cell at row {} column {} references missing shared string '{}'",
                        self.row,
                        self.column,
                        self.value
                    );
                    CellValue::Empty
                }
            },
            Some("inlineStr") => CellValue::Text(self.inline),
            Some("str") | Some("d") => CellValue::Text(self.value),
            Some("b") => CellValue::Bool(self.value.trim() == "1"),
            Some("e") => {
                log::debug!(
                    "Error value '{}' at row {} column {} read as empty",
                    self.value,
                    self.row,
                    self.column
                );
                CellValue::Empty
            }
            _ => {
                let raw = self.value.trim();
                if raw.is_empty() {
                    CellValue::Empty
                } else {
                    match raw.parse::<f64>() {
                        Ok(n) => CellValue::Number(n),
                        Err(_) => {
                            log::warn!(
                                "Non-numeric value '{}' in numeric cell at row {} column {}",
                                raw,
                                self.row,
                                self.column
                            );
                            CellValue::Text(raw.to_string())
                        }
                    }
                }
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Unescaped value of the attribute whose local name is `key`.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
        })
}

fn row_attribute(e: &BytesStart<'_>) -> Option<usize> {
    attribute(e, b"r").and_then(|r| r.trim().parse().ok())
}

/// Convert column letters to a 0-based index ("A" -> 0, "AA" -> 26).
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .map(|b| (b.to_ascii_uppercase() - b'A') as usize + 1)
        .fold(0, |acc, d| acc * 26 + d)
        - 1
}

/// Split "B12" into (0-based column, 1-based row).
fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let captures = CELL_REF_REGEX.captures(reference.trim())?;
    let row = captures[2].parse::<usize>().ok()?;
    Some((column_index(&captures[1]), row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Summary" sheetId="1" r:id="rId1"/>
    <sheet name="Donation" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>Date</t></si>
  <si><t>Particulars</t></si>
  <si><r><t>Dr. Asha</t></r><r><t xml:space="preserve"> Verma</t></r><rPh><t>IGNORED</t></rPh></si>
  <si><t>Kolkata &amp; Howrah</t></si>
</sst>"#;

    fn sheet_xml(header_row: usize) -> String {
        let data_row = header_row + 1;
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:D{data_row}"/>
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>Jeev Sewa Foundation</t></is></c></row>
    <row r="{header_row}"><c r="A{header_row}" t="s"><v>0</v></c><c r="B{header_row}" t="s"><v>1</v></c><c r="D{header_row}" t="inlineStr"><is><t> Donation </t></is></c></row>
    <row r="{data_row}"><c r="A{data_row}"><v>45387</v></c><c r="B{data_row}" t="s"><v>2</v></c><c r="C{data_row}" t="s"><v>3</v></c><c r="D{data_row}"><f>SUM(1500)</f><v>1500</v></c></row>
  </sheetData>
</worksheet>"#
        )
    }

    fn build_workbook(sheet2: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let parts = [
            ("xl/workbook.xml", WORKBOOK.to_string()),
            ("xl/_rels/workbook.xml.rels", RELS.to_string()),
            ("xl/sharedStrings.xml", SHARED.to_string()),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData/></worksheet>"#.to_string(),
            ),
            ("xl/worksheets/sheet2.xml", sheet2.to_string()),
        ];
        for (path, content) in parts {
            zip.start_file(path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), 0);
        assert_eq!(column_index("d"), 3);
        assert_eq!(column_index("Z"), 25);
        assert_eq!(column_index("AA"), 26);
        assert_eq!(column_index("AZ"), 51);
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 1)));
        assert_eq!(parse_cell_ref("C12"), Some((2, 12)));
        assert_eq!(parse_cell_ref("$B$3"), Some((1, 3)));
        assert_eq!(parse_cell_ref("12"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"x:row"), b"row");
        assert_eq!(local_name(b"r:id"), b"id");
        assert_eq!(local_name(b"c"), b"c");
    }

    #[test]
    fn test_sheet_names_in_order() {
        let bytes = build_workbook(&sheet_xml(11));
        let names = XlsxReader::new().sheet_names(Cursor::new(bytes)).unwrap();
        assert_eq!(names, vec!["Summary", "Donation"]);
    }

    #[test]
    fn test_read_donation_sheet() {
        let bytes = build_workbook(&sheet_xml(11));
        let table = XlsxReader::new().read(Cursor::new(bytes)).unwrap();

        assert_eq!(
            table.columns,
            vec!["Date", "Particulars", "Unnamed: 2", "Donation"]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 0), CellValue::Number(45387.0));
        assert_eq!(table.cell(0, 1), CellValue::Text("Dr. Asha Verma".to_string()));
        assert_eq!(table.cell(0, 2), CellValue::Text("Kolkata & Howrah".to_string()));
        assert_eq!(table.cell(0, 3), CellValue::Number(1500.0));
    }

    #[test]
    fn test_custom_header_row() {
        let bytes = build_workbook(&sheet_xml(3));
        let table = XlsxReader::new()
            .with_header_row(2)
            .read(Cursor::new(bytes))
            .unwrap();

        assert_eq!(table.columns[0], "Date");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_header_row_ignores_leading_blank_rows() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A3:B12"/>
  <sheetData>
    <row r="3"><c r="A3" t="inlineStr"><is><t>Jeev Sewa Foundation</t></is></c></row>
    <row r="11"><c r="A11" t="s"><v>0</v></c><c r="B11" t="s"><v>1</v></c></row>
    <row r="12"><c r="A12"><v>45387</v></c><c r="B12" t="s"><v>2</v></c></row>
  </sheetData>
</worksheet>"#;
        let bytes = build_workbook(xml);
        let table = XlsxReader::new().read(Cursor::new(bytes)).unwrap();

        assert_eq!(table.columns, vec!["Date", "Particulars"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1), CellValue::Text("Dr. Asha Verma".to_string()));
    }

    #[test]
    fn test_missing_header_row() {
        let bytes = build_workbook(&sheet_xml(5));
        let result = XlsxReader::new().read(Cursor::new(bytes));

        assert!(matches!(result, Err(Error::XlsxParseError(_))));
    }

    #[test]
    fn test_missing_sheet() {
        let bytes = build_workbook(&sheet_xml(11));
        let result = XlsxReader::new()
            .with_sheet("Ledger")
            .read(Cursor::new(bytes));

        match result {
            Err(Error::XlsxParseError(message)) => {
                assert!(message.contains("Ledger"));
                assert!(message.contains("Summary, Donation"));
            }
            other => panic!("expected XlsxParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let result = XlsxReader::new().read(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_cells_without_references() {
        let reader = XlsxReader::new();
        let xml = r#"<worksheet><sheetData>
            <row><c t="inlineStr"><is><t>a</t></is></c><c t="b"><v>1</v></c></row>
            <row><c><v>2.5</v></c><c t="e"><v>#N/A</v></c></row>
        </sheetData></worksheet>"#;

        let grid = reader.parse_sheet(xml, &[]).unwrap();
        assert_eq!(grid.rows[&1][&0], CellValue::Text("a".to_string()));
        assert_eq!(grid.rows[&1][&1], CellValue::Bool(true));
        assert_eq!(grid.rows[&2][&0], CellValue::Number(2.5));
        assert!(!grid.rows[&2].contains_key(&1));
    }
}
