//! # excelport
//!
//! Round-trip Excel workbooks through JSON and YAML without losing cell types,
//! styles or metadata.
//!
//! ## Features
//!
//! - **Four formats**: `.xlsx`, plain `.json`, type-preserving `.pyexcel.json` and `.yaml`/`.yml`
//! - **Typed cells**: null, boolean, integer, float and string survive a `.pyexcel.json` round trip
//! - **Metadata sheet**: an ordered `_meta` table travels with the data, `modified` stamped on save
//! - **Cell styles**: each cell's resolved format (number format, font, fill, border, alignment) is carried through text formats and reapplied
//! - **Ordered**: sheets, rows and metadata keep their insertion order in every format
//!
//! ## Quick Start
//!
//! ### Converting a workbook
//!
//! ```rust,no_run
//! use excelport::{SaveOptions, Workbook};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut book = Workbook::open("report.xlsx")?;
//! book.save("report.pyexcel.json", &SaveOptions::default())?;
//!
//! // and back again, styles included
//! let mut book = Workbook::open("report.pyexcel.json")?;
//! book.save("report-copy.xlsx", &SaveOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Building a workbook in memory
//!
//! ```rust,no_run
//! use excelport::{CellFormat, CellRef, CellStyle, CellValue, Font, SaveOptions, StyleSheet, Workbook};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut book = Workbook::new();
//! book.meta_mut().set("created", json!("2024-01-01T00:00:00"));
//! book.insert_sheet(
//!     "People",
//!     vec![
//!         vec![CellValue::from("Name"), CellValue::from("Age")],
//!         vec![CellValue::from("Alice"), CellValue::Int(30)],
//!     ],
//! );
//!
//! let mut styles = StyleSheet::new();
//! styles.set("People", CellRef::new(0, 0), CellStyle::HeaderBold);
//! styles.set("People", CellRef::new(0, 1), CellStyle::HeaderBold);
//! styles.set(
//!     "People",
//!     CellRef::new(1, 1),
//!     CellFormat::new().with_number_format("0").with_font(Font {
//!         size: Some(12.0),
//!         name: Some("Arial".to_string()),
//!         ..Font::default()
//!     }),
//! );
//! book.meta_mut().set_styles(&styles)?;
//!
//! book.save("people.xlsx", &SaveOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod meta;
pub mod projection;
pub mod styles;
pub mod text;
pub mod types;
pub mod xlsx;

pub use book::{load, save, stylesheet, SessionState, Workbook};
pub use config::SaveOptions;
pub use error::{ExcelError, Result};
pub use format::Format;
pub use meta::Meta;
pub use styles::StyleSheet;
pub use types::{
    Alignment, Border, BorderLine, CellFormat, CellRef, CellStyle, CellValue, Color, Fill, Font,
    RawBook, Sheet,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExcelError>;
        let _ = std::marker::PhantomData::<Workbook>;
        let _ = std::marker::PhantomData::<StyleSheet>;
        let _ = std::marker::PhantomData::<CellFormat>;
        let _ = std::marker::PhantomData::<SaveOptions>;
    }
}
