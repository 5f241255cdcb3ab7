//! Type definitions for workbook data

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered rows of raw cells, as exchanged with the file codecs
pub type Matrix = Vec<Vec<Value>>;

/// Ordered mapping of sheet name to raw matrix
pub type RawBook = IndexMap<String, Matrix>;

/// Ordered rows of typed cells
pub type Sheet = Vec<Vec<CellValue>>;

/// Named shortcuts for common cell formats
///
/// Each preset expands to a full [`CellFormat`]; workbooks only ever store the
/// expanded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    /// Default style - no formatting
    Default,
    /// Bold text for headers
    HeaderBold,
    /// Integer format with thousand separator (#,##0)
    NumberInteger,
    /// Decimal format with 2 places (#,##0.00)
    NumberDecimal,
    /// Currency format ($#,##0.00)
    NumberCurrency,
    /// Percentage format (0.00%)
    NumberPercentage,
    /// Date format (MM/DD/YYYY)
    DateDefault,
    /// DateTime format (MM/DD/YYYY HH:MM:SS)
    DateTimestamp,
    /// Bold text for emphasis
    TextBold,
    /// Italic text for notes
    TextItalic,
    /// Yellow background highlight
    HighlightYellow,
    /// Green background highlight
    HighlightGreen,
    /// Red background highlight
    HighlightRed,
    /// Thin borders on all sides
    BorderThin,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A colour as a package states it: ARGB, theme slot or legacy palette index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Color {
    /// ARGB hex, upper case (`FFFF0000`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
    #[serde(skip_serializing_if = "is_false")]
    pub auto: bool,
}

impl Color {
    pub fn rgb(argb: &str) -> Color {
        Color {
            rgb: Some(argb.to_ascii_uppercase()),
            ..Color::default()
        }
    }
}

/// Font traits; unset fields fall back to the workbook's default font
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strike: bool,
    /// Underline kind: `single`, `double`, `singleAccounting`, `doubleAccounting`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    /// Size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Font {
    pub fn is_default(&self) -> bool {
        *self == Font::default()
    }
}

/// Pattern fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fill {
    /// `patternType`, such as `solid` or `darkGray`
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<Color>,
}

impl Fill {
    /// Solid fill in one ARGB colour
    pub fn solid(argb: &str) -> Fill {
        Fill {
            pattern: "solid".to_string(),
            fg_color: Some(Color::rgb(argb)),
            bg_color: None,
        }
    }
}

/// One edge of a cell border
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderLine {
    /// Line style, such as `thin`, `medium` or `dashed`
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl BorderLine {
    pub fn new(style: &str) -> BorderLine {
        BorderLine {
            style: style.to_string(),
            color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderLine>,
}

impl Border {
    /// The same line on all four sides
    pub fn all(line: BorderLine) -> Border {
        Border {
            left: Some(line.clone()),
            right: Some(line.clone()),
            top: Some(line.clone()),
            bottom: Some(line),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Border::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub wrap_text: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub shrink_to_fit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_rotation: Option<u32>,
}

impl Alignment {
    pub fn is_default(&self) -> bool {
        *self == Alignment::default()
    }
}

/// Everything a workbook records about how one cell looks
///
/// This is the resolved form of a `cellXfs` entry: the number format code and the
/// font, fill, border and alignment it points at. It serializes to a compact JSON
/// object in which unset parts are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellFormat {
    /// Number format code (`#,##0.00`); `None` is General
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Font::is_default")]
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Border::is_default")]
    pub border: Border,
    #[serde(skip_serializing_if = "Alignment::is_default")]
    pub alignment: Alignment,
}

impl CellFormat {
    pub fn new() -> Self {
        CellFormat::default()
    }

    pub fn is_default(&self) -> bool {
        *self == CellFormat::default()
    }

    pub fn with_number_format(mut self, code: &str) -> Self {
        self.number_format = Some(code.to_string());
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

impl From<CellStyle> for CellFormat {
    fn from(style: CellStyle) -> Self {
        let format = CellFormat::new();
        match style {
            CellStyle::Default => format,
            CellStyle::HeaderBold | CellStyle::TextBold => format.with_font(Font {
                bold: true,
                ..Font::default()
            }),
            CellStyle::NumberInteger => format.with_number_format("#,##0"),
            CellStyle::NumberDecimal => format.with_number_format("#,##0.00"),
            CellStyle::NumberCurrency => format.with_number_format("\"$\"#,##0.00"),
            CellStyle::NumberPercentage => format.with_number_format("0.00%"),
            CellStyle::DateDefault => format.with_number_format("mm/dd/yyyy"),
            CellStyle::DateTimestamp => format.with_number_format("mm/dd/yyyy hh:mm:ss"),
            CellStyle::TextItalic => format.with_font(Font {
                italic: true,
                ..Font::default()
            }),
            CellStyle::HighlightYellow => format.with_fill(Fill::solid("FFFFFF00")),
            CellStyle::HighlightGreen => format.with_fill(Fill::solid("FF00FF00")),
            CellStyle::HighlightRed => format.with_fill(Fill::solid("FFFF0000")),
            CellStyle::BorderThin => format.with_border(Border::all(BorderLine::new("thin"))),
        }
    }
}

/// A single typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl CellValue {
    /// Check if cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Name of the scalar kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "boolean",
            CellValue::Int(_) | CellValue::Float(_) => "number",
            CellValue::String(_) => "string",
        }
    }

    /// Convert to a raw JSON value
    pub fn to_value(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            // Non-finite floats have no JSON form and become null
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::String(s) => Value::String(s.clone()),
        }
    }

    /// Convert a raw JSON value into a cell
    ///
    /// Arrays and objects have no cell representation and are kept as their JSON text.
    pub fn from_value(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => CellValue::String(value.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        CellValue::from_value(value)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        CellValue::from_value(&value)
    }
}

impl From<&CellValue> for Value {
    fn from(cell: &CellValue) -> Self {
        cell.to_value()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Position of a cell in a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based)
    pub col: u32,
}

impl CellRef {
    /// Create a new cell reference
    pub fn new(row: u32, col: u32) -> Self {
        CellRef { row, col }
    }

    /// Get Excel-style cell reference (e.g., "A1", "B2")
    pub fn reference(&self) -> String {
        format!("{}{}", Self::col_to_letter(self.col), self.row + 1)
    }

    /// Parse an Excel-style reference such as "AA10"
    pub fn parse(reference: &str) -> Option<CellRef> {
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(reference.len());
        let (letters, digits) = reference.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut col = 0u32;
        for ch in letters.chars() {
            let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = col.checked_mul(26)?.checked_add(digit)?;
        }

        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }

        Some(CellRef::new(row - 1, col - 1))
    }

    /// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
    pub fn col_to_letter(col: u32) -> String {
        let mut result = String::new();
        let mut col = col + 1;

        while col > 0 {
            col -= 1;
            result.insert(0, (b'A' + (col % 26) as u8) as char);
            col /= 26;
        }

        result
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}
