//! `.xlsx` package support
//!
//! [`XlsxWriter`] produces a minimal package (workbook, worksheets, shared strings
//! and a stylesheet holding the formats its cells use); [`XlsxReader`] reads any
//! package's sheets, cell values and resolved cell formats.

mod reader;
mod shared_strings;
mod stylesheet;
mod writer;
mod xml_writer;

pub use reader::XlsxReader;
pub use writer::XlsxWriter;

use crate::error::Result;
use crate::styles::StyleSheet;
use crate::types::{CellValue, RawBook};
use std::path::Path;

/// Read every sheet of a workbook
pub fn read_book<P: AsRef<Path>>(path: P) -> Result<RawBook> {
    XlsxReader::open(path)?.read_book()
}

/// Write a raw book, applying `styles` to the cells they name
pub fn write_book<P: AsRef<Path>>(
    path: P,
    book: &RawBook,
    styles: Option<&StyleSheet>,
) -> Result<()> {
    let mut writer = XlsxWriter::new(path)?;
    for (name, rows) in book {
        let sheet_styles = styles.and_then(|s| s.sheet(name)).unwrap_or_default();
        writer.add_worksheet(name, sheet_styles)?;

        let mut cells = Vec::new();
        for row in rows {
            cells.clear();
            cells.extend(row.iter().map(CellValue::from_value));
            writer.write_row(&cells)?;
        }
    }
    writer.close()
}
