//! Workbook writer: typed cells, shared strings and the stylesheet of the formats used

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::shared_strings::SharedStrings;
use super::stylesheet::StyleTable;
use super::xml_writer::{XmlWriter, XML_DECLARATION};
use crate::error::{ExcelError, Result};
use crate::types::{CellFormat, CellRef, CellValue};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Excel rejects sheet names longer than this
const MAX_SHEET_NAME: usize = 31;

struct OpenSheet {
    row: u32,
    // cell -> `cellXfs` index
    styles: HashMap<CellRef, u32>,
}

/// Writes an `.xlsx` package sheet by sheet, row by row
pub struct XlsxWriter {
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
    shared_strings: SharedStrings,
    styles: StyleTable,
    worksheets: Vec<String>,
    current: Option<OpenSheet>,
    xml_buffer: Vec<u8>,
}

impl XlsxWriter {
    /// Create the package file, truncating any existing file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(64 * 1024, file);

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6));

        Ok(XlsxWriter {
            zip: ZipWriter::new(writer),
            options,
            shared_strings: SharedStrings::new(),
            styles: StyleTable::new(),
            worksheets: Vec::new(),
            current: None,
            xml_buffer: Vec::with_capacity(8192),
        })
    }

    /// Start a new worksheet; `styles` are applied to the matching cells written next
    pub fn add_worksheet<I>(&mut self, name: &str, styles: I) -> Result<()>
    where
        I: IntoIterator<Item = (CellRef, CellFormat)>,
    {
        self.finish_current_worksheet()?;

        if name.chars().count() > MAX_SHEET_NAME
            || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        {
            log::warn!("sheet name {:?} is not accepted by Excel", name);
        }

        self.worksheets.push(name.to_string());
        let sheet_path = format!("xl/worksheets/sheet{}.xml", self.worksheets.len());
        self.zip.start_file(sheet_path, self.options)?;

        let mut xml_writer = XmlWriter::new(&mut self.zip);
        xml_writer.write_str(XML_DECLARATION)?;
        xml_writer.start_element("worksheet")?;
        xml_writer.attribute("xmlns", MAIN_NS)?;
        xml_writer.attribute("xmlns:r", REL_NS)?;
        xml_writer.close_start_tag()?;
        xml_writer.start_element("sheetData")?;
        xml_writer.close_start_tag()?;
        xml_writer.flush()?;

        let mut indices = HashMap::new();
        for (cell, format) in styles {
            let index = self.styles.add(&format)?;
            if index != 0 {
                indices.insert(cell, index);
            }
        }
        self.current = Some(OpenSheet {
            row: 0,
            styles: indices,
        });
        Ok(())
    }

    /// Write a row to the current worksheet
    ///
    /// Null cells are left out unless a style is recorded for them.
    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        let sheet = self
            .current
            .as_mut()
            .ok_or_else(|| ExcelError::WriteError("No active worksheet".to_string()))?;

        let row_index = sheet.row;
        sheet.row += 1;

        let mut num = itoa::Buffer::new();
        let row_num = row_index + 1;

        self.xml_buffer.clear();
        self.xml_buffer.extend_from_slice(b"<row r=\"");
        self.xml_buffer
            .extend_from_slice(num.format(row_num).as_bytes());
        self.xml_buffer.extend_from_slice(b"\">");

        for (col_idx, value) in cells.iter().enumerate() {
            let cell_ref = CellRef::new(row_index, col_idx as u32);
            let style = sheet.styles.get(&cell_ref).copied();

            if value.is_null() && style.is_none() {
                continue;
            }

            self.xml_buffer.extend_from_slice(b"<c r=\"");
            self.xml_buffer
                .extend_from_slice(cell_ref.reference().as_bytes());
            self.xml_buffer.push(b'"');

            if let Some(style) = style {
                self.xml_buffer.extend_from_slice(b" s=\"");
                self.xml_buffer
                    .extend_from_slice(num.format(style).as_bytes());
                self.xml_buffer.push(b'"');
            }

            match value {
                CellValue::Null => {
                    self.xml_buffer.extend_from_slice(b"/>");
                }
                CellValue::Int(i) => {
                    self.xml_buffer.extend_from_slice(b"><v>");
                    self.xml_buffer.extend_from_slice(num.format(*i).as_bytes());
                    self.xml_buffer.extend_from_slice(b"</v></c>");
                }
                CellValue::Float(f) if f.is_finite() => {
                    self.xml_buffer.extend_from_slice(b"><v>");
                    self.xml_buffer.extend_from_slice(f.to_string().as_bytes());
                    self.xml_buffer.extend_from_slice(b"</v></c>");
                }
                CellValue::Bool(b) => {
                    self.xml_buffer.extend_from_slice(b" t=\"b\"><v>");
                    self.xml_buffer
                        .extend_from_slice(if *b { b"1" } else { b"0" });
                    self.xml_buffer.extend_from_slice(b"</v></c>");
                }
                CellValue::Float(_) | CellValue::String(_) => {
                    if let CellValue::Float(f) = value {
                        log::warn!("{} has no numeric form in a workbook, stored as text", f);
                    }
                    let index = self.shared_strings.add_string(&value.to_string());
                    self.xml_buffer.extend_from_slice(b" t=\"s\"><v>");
                    self.xml_buffer.extend_from_slice(num.format(index).as_bytes());
                    self.xml_buffer.extend_from_slice(b"</v></c>");
                }
            }
        }

        self.xml_buffer.extend_from_slice(b"</row>");
        self.zip.write_all(&self.xml_buffer)?;
        Ok(())
    }

    fn finish_current_worksheet(&mut self) -> Result<()> {
        if self.current.take().is_none() {
            return Ok(());
        }

        let mut xml_writer = XmlWriter::new(&mut self.zip);
        xml_writer.end_element("sheetData")?;
        xml_writer.end_element("worksheet")?;
        xml_writer.flush()
    }

    /// Finish the last sheet and write the remaining package parts
    pub fn close(mut self) -> Result<()> {
        if self.worksheets.is_empty() {
            // A workbook needs at least one sheet to open in Excel
            self.add_worksheet("Sheet1", std::iter::empty())?;
        }
        self.finish_current_worksheet()?;

        self.zip.start_file("xl/sharedStrings.xml", self.options)?;
        self.shared_strings
            .write_xml(&mut XmlWriter::new(&mut self.zip))?;

        self.zip.start_file("xl/workbook.xml", self.options)?;
        self.write_workbook_xml()?;

        self.zip.start_file("xl/_rels/workbook.xml.rels", self.options)?;
        self.write_workbook_rels()?;

        self.zip.start_file("xl/styles.xml", self.options)?;
        self.styles.write_xml(&mut XmlWriter::new(&mut self.zip))?;

        self.zip.start_file("[Content_Types].xml", self.options)?;
        self.write_content_types()?;

        self.zip.start_file("_rels/.rels", self.options)?;
        self.zip.write_all(ROOT_RELS.as_bytes())?;

        self.zip.start_file("docProps/core.xml", self.options)?;
        self.write_core_props()?;

        self.zip.start_file("docProps/app.xml", self.options)?;
        self.zip.write_all(APP_PROPS.as_bytes())?;

        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(())
    }

    fn write_workbook_xml(&mut self) -> Result<()> {
        let mut xml_writer = XmlWriter::new(&mut self.zip);

        xml_writer.write_str(XML_DECLARATION)?;
        xml_writer.start_element("workbook")?;
        xml_writer.attribute("xmlns", MAIN_NS)?;
        xml_writer.attribute("xmlns:r", REL_NS)?;
        xml_writer.close_start_tag()?;

        xml_writer.start_element("sheets")?;
        xml_writer.close_start_tag()?;

        for (i, name) in self.worksheets.iter().enumerate() {
            let sheet_id = i + 1;
            xml_writer.start_element("sheet")?;
            xml_writer.attribute("name", name)?;
            xml_writer.attribute_int("sheetId", sheet_id)?;
            xml_writer.attribute("r:id", &format!("rId{}", sheet_id))?;
            xml_writer.close_empty()?;
        }

        xml_writer.end_element("sheets")?;
        xml_writer.end_element("workbook")?;
        xml_writer.flush()
    }

    fn write_workbook_rels(&mut self) -> Result<()> {
        let count = self.worksheets.len();
        let mut xml_writer = XmlWriter::new(&mut self.zip);

        xml_writer.write_str(XML_DECLARATION)?;
        xml_writer.start_element("Relationships")?;
        xml_writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )?;
        xml_writer.close_start_tag()?;

        let mut relationship = |id: usize, kind: &str, target: &str| -> Result<()> {
            xml_writer.start_element("Relationship")?;
            xml_writer.attribute("Id", &format!("rId{}", id))?;
            xml_writer.attribute("Type", &format!("{}/{}", REL_NS, kind))?;
            xml_writer.attribute("Target", target)?;
            xml_writer.close_empty()
        };

        for i in 1..=count {
            relationship(i, "worksheet", &format!("worksheets/sheet{}.xml", i))?;
        }
        relationship(count + 1, "styles", "styles.xml")?;
        relationship(count + 2, "sharedStrings", "sharedStrings.xml")?;

        xml_writer.end_element("Relationships")?;
        xml_writer.flush()
    }

    fn write_content_types(&mut self) -> Result<()> {
        let mut xml_writer = XmlWriter::new(&mut self.zip);

        xml_writer.write_str(XML_DECLARATION)?;
        xml_writer.write_str(
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
        )?;
        for i in 1..=self.worksheets.len() {
            xml_writer.start_element("Override")?;
            xml_writer.attribute("PartName", &format!("/xl/worksheets/sheet{}.xml", i))?;
            xml_writer.attribute(
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            )?;
            xml_writer.close_empty()?;
        }
        xml_writer.write_str(
            "<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
</Types>",
        )?;
        xml_writer.flush()
    }

    fn write_core_props(&mut self) -> Result<()> {
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut xml_writer = XmlWriter::new(&mut self.zip);

        xml_writer.write_str(XML_DECLARATION)?;
        xml_writer.write_str(
            "<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
<dc:creator>excelport</dc:creator><cp:lastModifiedBy>excelport</cp:lastModifiedBy>",
        )?;
        xml_writer.write_str("<dcterms:created xsi:type=\"dcterms:W3CDTF\">")?;
        xml_writer.write_str(&now)?;
        xml_writer.write_str("</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">")?;
        xml_writer.write_str(&now)?;
        xml_writer.write_str("</dcterms:modified></cp:coreProperties>")?;
        xml_writer.flush()
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>excelport</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#;
