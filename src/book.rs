//! The in-memory workbook and its load/save protocols
//!
//! A [`Workbook`] holds ordered sheets of typed cells plus a [`Meta`] table. Loading
//! resolves the format from the file name, decodes type-preserving cells, lifts the
//! `_meta` sheet into the table and, for workbook files, records the cell styles.
//! Saving builds a fresh payload from the document (the document itself is left
//! alone apart from the `modified` stamp) and hands it to the matching writer.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::Value;

use crate::config::SaveOptions;
use crate::error::Result;
use crate::format::Format;
use crate::meta::{Meta, META_SHEET, STYLES};
use crate::projection::{project_in, project_meta_out, project_out};
use crate::styles::StyleSheet;
use crate::text;
use crate::types::{CellValue, RawBook, Sheet};
use crate::xlsx::{self, XlsxReader};

/// Where a workbook is in its load/save life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built in memory, not read from a file
    Unloaded,
    /// Read from a file and not saved since
    Loaded,
    /// Saved at least once; saving again is allowed
    Saved,
}

/// Ordered sheets of typed cells plus a metadata table
#[derive(Debug, Clone)]
pub struct Workbook {
    meta: Meta,
    sheets: IndexMap<String, Sheet>,
    source: Option<PathBuf>,
    state: SessionState,
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new()
    }
}

impl Workbook {
    /// Create an empty workbook with an empty metadata table
    pub fn new() -> Self {
        Workbook::with_meta(Meta::new())
    }

    /// Create an empty workbook whose metadata starts from `meta`
    pub fn with_meta(meta: Meta) -> Self {
        Workbook {
            meta,
            sheets: IndexMap::new(),
            source: None,
            state: SessionState::Unloaded,
        }
    }

    /// Load a workbook from `path`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use excelport::Workbook;
    ///
    /// let book = Workbook::open("report.xlsx")?;
    /// for (name, rows) in book.sheets() {
    ///     println!("{}: {} rows", name, rows.len());
    /// }
    /// # Ok::<(), excelport::ExcelError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Workbook::open_with(path, Meta::new())
    }

    /// Load a workbook, merging its metadata over `defaults`
    ///
    /// Keys in `defaults` that the file does not carry keep their values.
    pub fn open_with<P: AsRef<Path>>(path: P, defaults: Meta) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        log::debug!("loading {} as {}", path.display(), format);

        let mut meta = defaults;
        let (mut raw, styles) = match format {
            Format::Xlsx => {
                let mut reader = XlsxReader::open(path)?;
                let raw = reader.read_book()?;
                (raw, Some(reader.read_styles()?))
            }
            Format::PyexcelJson | Format::Json => (text::read_json(path)?, None),
            Format::Yaml => (text::read_yaml(path)?, None),
        };

        if format.is_type_preserving() {
            for rows in raw.values_mut() {
                for row in rows.iter_mut() {
                    *row = project_in(row, format);
                }
            }
        }

        if let Some(rows) = raw.shift_remove(META_SHEET) {
            meta.from_rows(&rows);
            meta.pin_timestamps();
        }
        if let Some(styles) = styles {
            meta.set_styles(&styles)?;
        }

        let sheets: IndexMap<String, Sheet> = raw
            .into_iter()
            .map(|(name, rows)| {
                let rows: Sheet = rows
                    .iter()
                    .map(|row| row.iter().map(CellValue::from_value).collect())
                    .collect();
                (name, rows)
            })
            .collect();

        Ok(Workbook {
            meta,
            sheets,
            source: Some(path.to_path_buf()),
            state: SessionState::Loaded,
        })
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    /// Sheets in document order
    pub fn sheets(&self) -> &IndexMap<String, Sheet> {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut IndexMap<String, Sheet> {
        &mut self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Add or replace a sheet; a replaced sheet keeps its position
    pub fn insert_sheet<S: Into<String>>(&mut self, name: S, rows: Sheet) -> Option<Sheet> {
        self.sheets.insert(name.into(), rows)
    }

    pub fn remove_sheet(&mut self, name: &str) -> Option<Sheet> {
        self.sheets.shift_remove(name)
    }

    /// File the workbook was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Build what a save in `format` would write, without writing it
    ///
    /// `_meta` comes first when kept; sheets whose name starts with `_` are left
    /// out. Workbook metadata rows wrap non-text values as JSON so they fit a cell.
    pub fn payload(&self, format: Format, options: &SaveOptions) -> RawBook {
        let mut book = RawBook::with_capacity(self.sheets.len() + 1);

        if options.retain_meta {
            let mut meta = self.meta.clone();
            if !options.retain_styles {
                meta.remove(STYLES);
            }
            let rows = match format {
                Format::Xlsx => meta.to_workbook_rows(),
                _ => meta.to_rows(),
            };
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| project_meta_out(row, format))
                .collect();
            book.insert(META_SHEET.to_string(), rows);
        }

        for (name, rows) in &self.sheets {
            if name.starts_with('_') {
                log::debug!("leaving internal sheet {} out of the payload", name);
                continue;
            }
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    let values: Vec<Value> = row.iter().map(CellValue::to_value).collect();
                    project_out(&values, format)
                })
                .collect();
            book.insert(name.clone(), rows);
        }

        book
    }

    /// Save to `path`, stamping `modified` with the local time
    pub fn save<P: AsRef<Path>>(&mut self, path: P, options: &SaveOptions) -> Result<()> {
        self.save_at(path, options, Local::now().naive_local())
    }

    /// Save to `path`, stamping `modified` with `now`
    ///
    /// The format comes from [`SaveOptions::format`] or else from the file name.
    pub fn save_at<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &SaveOptions,
        now: NaiveDateTime,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = match options.format {
            Some(format) => format,
            None => Format::from_path(path)?,
        };

        self.meta.stamp_modified(&now);
        let book = self.payload(format, options);
        log::debug!(
            "saving {} sheet(s) to {} as {}",
            book.len(),
            path.display(),
            format
        );

        match format {
            Format::Xlsx => {
                let styles = if options.retain_styles {
                    Some(self.workbook_styles(path))
                } else {
                    None
                };
                xlsx::write_book(path, &book, styles.as_ref())?;
            }
            Format::PyexcelJson | Format::Json => text::write_json(path, &book)?,
            Format::Yaml => text::write_yaml(path, &book)?,
        }

        self.state = SessionState::Saved;
        Ok(())
    }

    /// Styles to apply when writing a workbook to `path`
    ///
    /// Styles already on an existing file at `path` are kept unless the stored
    /// blob names the same cell.
    fn workbook_styles(&self, path: &Path) -> StyleSheet {
        let mut styles = if path.exists() {
            StyleSheet::extract(path).unwrap_or_else(|e| {
                log::warn!(
                    "ignoring styles of existing {}: {}",
                    path.display(),
                    e
                );
                StyleSheet::new()
            })
        } else {
            StyleSheet::new()
        };
        if let Some(stored) = self.meta.styles() {
            styles.merge(&stored);
        }
        styles
    }
}

/// Load a workbook from `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    Workbook::open(path)
}

/// Save a workbook to `path` with the default options
pub fn save<P: AsRef<Path>>(book: &mut Workbook, path: P) -> Result<()> {
    book.save(path, &SaveOptions::default())
}

/// Metadata table of the file at `path`, or an empty table when there is none
pub fn stylesheet(path: Option<&Path>) -> Result<Meta> {
    match path {
        Some(path) => Ok(Workbook::open(path)?.meta),
        None => Ok(Meta::new()),
    }
}
