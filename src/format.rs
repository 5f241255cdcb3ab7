//! File format resolution by extension

use crate::error::{ExcelError, Result};
use std::fmt;
use std::path::Path;

/// Storage formats a workbook can be loaded from or saved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `.xlsx` workbook container
    Xlsx,
    /// `.pyexcel.json`, JSON with every cell stored as a type-preserving token
    PyexcelJson,
    /// Any other `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl Format {
    /// Resolve the format from a path's extension and sub-extension
    ///
    /// Matching is case-sensitive: `data.XLSX` is rejected.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "xlsx" => Ok(Format::Xlsx),
            "json" => {
                let sub = path
                    .file_stem()
                    .map(Path::new)
                    .and_then(Path::extension)
                    .and_then(|e| e.to_str());
                if sub == Some("pyexcel") {
                    Ok(Format::PyexcelJson)
                } else {
                    Ok(Format::Json)
                }
            }
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(ExcelError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", other)
            })),
        }
    }

    /// Whether cells must go through the type-preserving codec
    pub fn is_type_preserving(&self) -> bool {
        matches!(self, Format::PyexcelJson)
    }

    /// Conventional file suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            Format::Xlsx => ".xlsx",
            Format::PyexcelJson => ".pyexcel.json",
            Format::Json => ".json",
            Format::Yaml => ".yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
