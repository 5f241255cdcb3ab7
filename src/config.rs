//! Save configuration

use crate::format::Format;

/// Options for [`Workbook::save`](crate::Workbook::save)
///
/// # Examples
///
/// ```
/// use excelport::{Format, SaveOptions};
///
/// let options = SaveOptions::new()
///     .with_retain_styles(false)
///     .with_format(Format::Yaml);
/// assert!(options.retain_meta);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Emit the `_meta` sheet
    pub retain_meta: bool,
    /// Keep the `_styles` entry and apply styles when writing a workbook
    pub retain_styles: bool,
    /// Output format; `None` derives it from the destination path
    pub format: Option<Format>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            retain_meta: true,
            retain_styles: true,
            format: None,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        SaveOptions::default()
    }

    pub fn with_retain_meta(mut self, retain: bool) -> Self {
        self.retain_meta = retain;
        self
    }

    pub fn with_retain_styles(mut self, retain: bool) -> Self {
        self.retain_styles = retain;
        self
    }

    /// Write in `format` whatever the destination's extension says
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}
