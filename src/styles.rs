//! Per-cell style descriptors carried through the metadata table
//!
//! Styles are keyed by sheet name and cell reference (`"B2"`), and each entry is a
//! full [`CellFormat`]. The whole table is stored opaquely under `_meta._styles` so
//! that text formats can carry it and a later save to `.xlsx` can put every style
//! back on its cell.

use crate::error::Result;
use crate::types::{CellFormat, CellRef};
use crate::xlsx::XlsxReader;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Style table: sheet name -> cell reference -> cell format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    sheets: IndexMap<String, IndexMap<String, CellFormat>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        StyleSheet::default()
    }

    /// Collect the styles of every cell of a workbook file
    pub fn extract<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = XlsxReader::open(path)?;
        reader.read_styles()
    }

    /// Assign a format to a cell; presets convert with `into`
    ///
    /// The default format is not stored; assigning it clears the cell.
    pub fn set<F: Into<CellFormat>>(&mut self, sheet: &str, cell: CellRef, format: F) {
        let format = format.into();
        if format.is_default() {
            if let Some(cells) = self.sheets.get_mut(sheet) {
                cells.shift_remove(&cell.reference());
            }
            return;
        }
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .insert(cell.reference(), format);
    }

    /// Format of a cell, if one was recorded
    pub fn get(&self, sheet: &str, cell: CellRef) -> Option<&CellFormat> {
        self.sheets.get(sheet)?.get(&cell.reference())
    }

    /// Formats recorded for one sheet, keyed by cell
    pub fn sheet(&self, sheet: &str) -> Option<IndexMap<CellRef, CellFormat>> {
        let cells = self.sheets.get(sheet)?;
        Some(
            cells
                .iter()
                .filter_map(|(reference, format)| {
                    let cell = CellRef::parse(reference);
                    if cell.is_none() {
                        log::debug!("skipping style for bad reference {}!{}", sheet, reference);
                    }
                    cell.map(|c| (c, format.clone()))
                })
                .collect(),
        )
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Number of styled cells across all sheets
    pub fn len(&self) -> usize {
        self.sheets.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer `incoming` over `self`; incoming descriptors win cell by cell
    pub fn merge(&mut self, incoming: &StyleSheet) {
        for (sheet, cells) in &incoming.sheets {
            let target = self.sheets.entry(sheet.clone()).or_default();
            for (reference, format) in cells {
                target.insert(reference.clone(), format.clone());
            }
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(StyleSheet::deserialize(value)?)
    }
}
