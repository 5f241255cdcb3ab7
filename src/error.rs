//! Error types for excelport

use thiserror::Error;

/// Result type alias for excelport operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all load/save operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// File extension does not map to a supported format
    #[error("Unsupported file format, {0}.")]
    UnsupportedFormat(String),

    /// Error occurred while reading a workbook
    #[error("Failed to read Excel file: {0}")]
    ReadError(String),

    /// Error occurred while writing a workbook
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// Input parsed but does not have the expected shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error wrapper
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// XML error wrapper
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// ZIP error wrapper
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

impl From<quick_xml::events::attributes::AttrError> for ExcelError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ExcelError::XmlError(quick_xml::Error::InvalidAttr(err))
    }
}
