//! Workbook reader: sheet order, shared strings, typed cells and cell styles
//!
//! Parts are pulled out of the package whole and parsed with `quick-xml`.
//! Cells land where their `r` reference puts them; gaps are filled with nulls and
//! rows that carry no cells stay as empty rows.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Number, Value};
use zip::result::ZipError;
use zip::ZipArchive;

use super::stylesheet::parse_cell_formats;
use crate::error::{ExcelError, Result};
use crate::styles::StyleSheet;
use crate::types::{CellRef, Matrix, RawBook};

struct SheetInfo {
    name: String,
    path: String,
}

/// Cells of one worksheet plus the raw `s` index of every styled cell
#[derive(Debug, Default)]
struct ParsedSheet {
    rows: Matrix,
    styles: Vec<(CellRef, u32)>,
}

/// Reads an `.xlsx` package
pub struct XlsxReader {
    archive: ZipArchive<BufReader<File>>,
    sst: Vec<String>,
    sheets: Vec<SheetInfo>,
}

impl XlsxReader {
    /// Open a workbook and load its sheet list and shared strings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ExcelError::ReadError(format!("Failed to open ZIP: {}", e)))?;

        let sheets = load_sheet_info(&mut archive)?;
        let sst = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        log::debug!(
            "opened workbook with {} sheet(s) and {} shared string(s)",
            sheets.len(),
            sst.len()
        );

        Ok(XlsxReader {
            archive,
            sst,
            sheets,
        })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Read the cells of one sheet
    pub fn read_sheet(&mut self, name: &str) -> Result<Matrix> {
        Ok(self.parse_sheet(name)?.rows)
    }

    /// Read every sheet, in workbook order
    pub fn read_book(&mut self) -> Result<RawBook> {
        let mut book = RawBook::with_capacity(self.sheets.len());
        for name in self.sheet_names() {
            let rows = self.read_sheet(&name)?;
            book.insert(name, rows);
        }
        Ok(book)
    }

    /// Collect the resolved format of every styled cell
    ///
    /// Cells in the default format are left out.
    pub fn read_styles(&mut self) -> Result<StyleSheet> {
        let table = match read_part(&mut self.archive, "xl/styles.xml")? {
            Some(xml) => parse_cell_formats(&xml)?,
            None => Vec::new(),
        };

        let mut styles = StyleSheet::new();
        for name in self.sheet_names() {
            for (cell, index) in self.parse_sheet(&name)?.styles {
                match table.get(index as usize) {
                    Some(format) => styles.set(&name, cell, format.clone()),
                    None => log::debug!(
                        "style index {} out of range on {}!{}",
                        index,
                        name,
                        cell.reference()
                    ),
                }
            }
        }
        Ok(styles)
    }

    fn parse_sheet(&mut self, name: &str) -> Result<ParsedSheet> {
        let path = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.path.clone())
            .ok_or_else(|| {
                ExcelError::ReadError(format!(
                    "Sheet '{}' not found. Available sheets: {:?}",
                    name,
                    self.sheet_names()
                ))
            })?;

        let xml = read_part(&mut self.archive, &path)?.ok_or_else(|| {
            ExcelError::ReadError(format!("Worksheet part '{}' is missing", path))
        })?;
        parse_worksheet(&xml, &self.sst)
    }
}

/// Read a whole package part, `None` when the package does not have it
fn read_part(archive: &mut ZipArchive<BufReader<File>>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attribute in e.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Sheet names from `xl/workbook.xml`, resolved to part paths through the rels
fn load_sheet_info(archive: &mut ZipArchive<BufReader<File>>) -> Result<Vec<SheetInfo>> {
    let workbook = read_part(archive, "xl/workbook.xml")?
        .ok_or_else(|| ExcelError::ReadError("workbook.xml not found".to_string()))?;

    let mut entries: Vec<(String, Option<String>)> = Vec::new();
    let mut reader = Reader::from_reader(workbook.as_slice());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(e, b"name")?.unwrap_or_default();
                entries.push((name, attr(e, b"id")?));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut targets: Vec<(String, String)> = Vec::new();
    if let Some(rels) = read_part(archive, "xl/_rels/workbook.xml.rels")? {
        let mut reader = Reader::from_reader(rels.as_slice());
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(target)) = (attr(e, b"Id")?, attr(e, b"Target")?) {
                        targets.push((id, target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, id))| {
            let target = id.as_ref().and_then(|id| {
                targets
                    .iter()
                    .find(|(rel_id, _)| rel_id == id)
                    .map(|(_, target)| target.as_str())
            });
            let path = match target {
                Some(target) => match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                },
                None if targets.is_empty() => {
                    format!("xl/worksheets/sheet{}.xml", index + 1)
                }
                None => {
                    return Err(ExcelError::ReadError(format!(
                        "Sheet '{}' has no relationship target",
                        name
                    )))
                }
            };
            Ok(SheetInfo { name, path })
        })
        .collect()
}

/// Plain text of every `<si>` item; phonetic runs are skipped
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(ref e) if in_t => current.push_str(&e.unescape()?),
            Event::CData(e) if in_t => current.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// The cell being read
struct OpenCell {
    col: u32,
    kind: Option<String>,
    style: u32,
    value: Option<String>,
    inline: Option<String>,
}

fn parse_worksheet(xml: &[u8], sst: &[String]) -> Result<ParsedSheet> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut sheet = ParsedSheet::default();

    let mut row_index: u32 = 0;
    let mut cell: Option<OpenCell> = None;
    let mut in_v = false;
    let mut in_inline_t = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"row" => {
                let index = attr(e, b"r")?
                    .and_then(|r| r.trim().parse::<u32>().ok())
                    .filter(|r| *r > 0)
                    .map(|r| r - 1)
                    .unwrap_or(sheet.rows.len() as u32);
                while sheet.rows.len() <= index as usize {
                    sheet.rows.push(Vec::new());
                }
                row_index = index;
            }
            Event::Start(ref e) if e.local_name().as_ref() == b"c" => {
                cell = Some(open_cell(e, &sheet, row_index)?);
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"c" => {
                let open = open_cell(e, &sheet, row_index)?;
                close_cell(&mut sheet, row_index, open, sst);
            }
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"v" => in_v = cell.is_some(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => {
                    if let Some(open) = cell.as_mut() {
                        in_inline_t = true;
                        open.inline.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if in_v || in_inline_t => {
                push_text(&mut cell, in_v, &e.unescape()?);
            }
            Event::CData(e) if in_v || in_inline_t => {
                push_text(&mut cell, in_v, &String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(open) = cell.take() {
                        close_cell(&mut sheet, row_index, open, sst);
                    }
                }
                b"v" => in_v = false,
                b"t" => in_inline_t = false,
                b"rPh" => in_phonetic = false,
                b"row" => row_index += 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

fn open_cell(e: &BytesStart<'_>, sheet: &ParsedSheet, row_index: u32) -> Result<OpenCell> {
    let col = match attr(e, b"r")?.as_deref().and_then(CellRef::parse) {
        Some(cell_ref) => cell_ref.col,
        None => sheet
            .rows
            .get(row_index as usize)
            .map_or(0, |row| row.len() as u32),
    };
    let style = attr(e, b"s")?
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    Ok(OpenCell {
        col,
        kind: attr(e, b"t")?,
        style,
        value: None,
        inline: None,
    })
}

fn push_text(cell: &mut Option<OpenCell>, in_v: bool, text: &str) {
    let Some(open) = cell.as_mut() else {
        return;
    };
    let target = if in_v {
        open.value.get_or_insert_with(String::new)
    } else {
        open.inline.get_or_insert_with(String::new)
    };
    target.push_str(text);
}

fn close_cell(sheet: &mut ParsedSheet, row_index: u32, cell: OpenCell, sst: &[String]) {
    if cell.style != 0 {
        sheet.styles.push((CellRef::new(row_index, cell.col), cell.style));
    }

    let value = cell_value(&cell, sst);
    if value.is_null() {
        return;
    }

    let Some(row) = sheet.rows.get_mut(row_index as usize) else {
        return;
    };
    let col = cell.col as usize;
    if row.len() <= col {
        row.resize(col + 1, Value::Null);
    }
    row[col] = value;
}

/// Typed value of a finished cell; empty text reads as null
fn cell_value(cell: &OpenCell, sst: &[String]) -> Value {
    let text = |s: &str| {
        if s.is_empty() {
            Value::Null
        } else {
            Value::String(s.to_string())
        }
    };

    match cell.kind.as_deref() {
        Some("s") => {
            let index = cell.value.as_deref().and_then(|v| v.trim().parse::<usize>().ok());
            match index.and_then(|i| sst.get(i)) {
                Some(s) => text(s),
                None => {
                    log::debug!("shared string {:?} out of range", cell.value);
                    Value::Null
                }
            }
        }
        Some("inlineStr") => cell.inline.as_deref().map_or(Value::Null, text),
        Some("b") => match cell.value.as_deref().map(str::trim) {
            Some("1") | Some("true") => Value::Bool(true),
            Some("0") | Some("false") => Value::Bool(false),
            _ => Value::Null,
        },
        Some("str") | Some("e") | Some("d") => cell.value.as_deref().map_or(Value::Null, text),
        _ => match cell.value.as_deref().map(str::trim) {
            None | Some("") => Value::Null,
            Some(raw) => number(raw).unwrap_or_else(|| Value::String(raw.to_string())),
        },
    }
}

/// Integral text reads as an integer, anything else numeric as a float
fn number(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    let f = raw.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Some(Value::Number((f as i64).into()));
    }
    Number::from_f64(f).map(Value::Number)
}
