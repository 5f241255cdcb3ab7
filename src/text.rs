//! JSON and YAML readers/writers for raw books
//!
//! Both grammars are parsed into an insertion-ordered `serde_json::Value` first and
//! then checked for the expected shape: a mapping of sheet name to a list of rows,
//! each row a list of cells.

use crate::error::{ExcelError, Result};
use crate::types::{Matrix, RawBook};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a JSON file into a raw book
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<RawBook> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    to_raw_book(value)
}

/// Read a YAML file into a raw book
pub fn read_yaml<P: AsRef<Path>>(path: P) -> Result<RawBook> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_yaml::from_reader(reader)?;
    to_raw_book(value)
}

/// Write a raw book as pretty JSON (two-space indent, non-ASCII kept verbatim)
pub fn write_json<P: AsRef<Path>>(path: P, book: &RawBook) -> Result<()> {
    let mut writer = BufWriter::with_capacity(64 * 1024, File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, book)?;
    writer.flush()?;
    Ok(())
}

/// Write a raw book as YAML
pub fn write_yaml<P: AsRef<Path>>(path: P, book: &RawBook) -> Result<()> {
    let mut writer = BufWriter::with_capacity(64 * 1024, File::create(path)?);
    serde_yaml::to_writer(&mut writer, book)?;
    writer.flush()?;
    Ok(())
}

/// Check and convert a parsed document into sheets of rows
///
/// An empty document or a `null` sheet/row counts as empty.
pub fn to_raw_book(value: Value) -> Result<RawBook> {
    let sheets = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(RawBook::new()),
        other => {
            return Err(ExcelError::InvalidFormat(format!(
                "expected a mapping of sheet names to rows, found {}",
                type_name(&other)
            )))
        }
    };

    let mut book = RawBook::with_capacity(sheets.len());
    for (name, rows) in sheets {
        let matrix = to_matrix(&name, rows)?;
        book.insert(name, matrix);
    }
    Ok(book)
}

fn to_matrix(sheet: &str, rows: Value) -> Result<Matrix> {
    let rows = match rows {
        Value::Array(rows) => rows,
        Value::Null => return Ok(Matrix::new()),
        other => {
            return Err(ExcelError::InvalidFormat(format!(
                "sheet '{}' must be a list of rows, found {}",
                sheet,
                type_name(&other)
            )))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(cells) => Ok(cells),
            Value::Null => Ok(Vec::new()),
            other => Err(ExcelError::InvalidFormat(format!(
                "row {} of sheet '{}' must be a list of cells, found {}",
                i + 1,
                sheet,
                type_name(&other)
            ))),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
