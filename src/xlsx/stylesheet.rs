//! `xl/styles.xml`: resolving `cellXfs` into [`CellFormat`]s and writing them back
//!
//! A cell's `s` attribute indexes `cellXfs`, and every `xf` there points into the
//! number format, font, fill and border tables. Reading resolves those references
//! into self-contained formats. Writing goes the other way: [`StyleTable`] interns
//! the parts of each format and hands out `xf` indices as formats are first seen.
//!
//! The first font and border and the first two fills (`none`, `gray125`) are the
//! package defaults. A format that uses them leaves the matching part unset.

use super::xml_writer::{XmlWriter, XML_DECLARATION};
use crate::error::Result;
use crate::types::{Alignment, Border, BorderLine, CellFormat, Color, Fill, Font};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Write;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Ids below this are reserved for built-in number formats
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Fills 0 and 1 are reserved
const RESERVED_FILLS: usize = 2;

/// Codes of the built-in number formats Excel documents for every locale
const BUILTIN_NUM_FMTS: &[(u32, &str)] = &[
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (5, r##""$"#,##0_);\("$"#,##0\)"##),
    (6, r##""$"#,##0_);[Red]\("$"#,##0\)"##),
    (7, r##""$"#,##0.00_);\("$"#,##0.00\)"##),
    (8, r##""$"#,##0.00_);[Red]\("$"#,##0.00\)"##),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

fn builtin_code(id: u32) -> Option<&'static str> {
    BUILTIN_NUM_FMTS
        .iter()
        .find(|(builtin, _)| *builtin == id)
        .map(|(_, code)| *code)
}

fn builtin_id(code: &str) -> Option<u32> {
    BUILTIN_NUM_FMTS
        .iter()
        .find(|(_, builtin)| *builtin == code)
        .map(|(id, _)| *id)
}

#[derive(Default)]
struct XfRef {
    num_fmt: u32,
    font: usize,
    fill: usize,
    border: usize,
    alignment: Alignment,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Other,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    fn from_tag(tag: &[u8]) -> Option<Side> {
        match tag {
            b"left" | b"start" => Some(Side::Left),
            b"right" | b"end" => Some(Side::Right),
            b"top" => Some(Side::Top),
            b"bottom" => Some(Side::Bottom),
            _ => None,
        }
    }

    fn of(self, border: &mut Border) -> &mut Option<BorderLine> {
        match self {
            Side::Left => &mut border.left,
            Side::Right => &mut border.right,
            Side::Top => &mut border.top,
            Side::Bottom => &mut border.bottom,
        }
    }
}

/// Resolve every `cellXfs` entry of a stylesheet into a format
pub fn parse_cell_formats(xml: &[u8]) -> Result<Vec<CellFormat>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut section = Section::Other;
    let mut num_fmts: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<Option<Fill>> = Vec::new();
    let mut borders: Vec<Border> = Vec::new();
    let mut xfs: Vec<XfRef> = Vec::new();
    // border edge whose children are being read
    let mut side: Option<Side> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let (e, empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" => {
                        section = Section::Other
                    }
                    tag if Side::from_tag(tag).is_some() || tag == b"diagonal" => side = None,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match (section, e.local_name().as_ref()) {
            (Section::Other, b"numFmts") if !empty => section = Section::NumFmts,
            (Section::Other, b"fonts") if !empty => section = Section::Fonts,
            (Section::Other, b"fills") if !empty => section = Section::Fills,
            (Section::Other, b"borders") if !empty => section = Section::Borders,
            (Section::Other, b"cellXfs") if !empty => section = Section::CellXfs,

            (Section::NumFmts, b"numFmt") => {
                if let Some(code) = attr(e, b"formatCode")? {
                    num_fmts.insert(number_attr(e, b"numFmtId")?, code);
                }
            }

            (Section::Fonts, b"font") => fonts.push(Font::default()),
            (Section::Fonts, tag) => {
                if let Some(font) = fonts.last_mut() {
                    read_font_part(font, tag, e)?;
                }
            }

            (Section::Fills, b"fill") => fills.push(None),
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = fills.last_mut() {
                    *fill = match attr(e, b"patternType")? {
                        Some(pattern) if pattern != "none" => Some(Fill {
                            pattern,
                            ..Fill::default()
                        }),
                        _ => None,
                    };
                }
            }
            (Section::Fills, b"fgColor") => {
                if let Some(Some(fill)) = fills.last_mut() {
                    fill.fg_color = Some(color(e)?);
                }
            }
            (Section::Fills, b"bgColor") => {
                if let Some(Some(fill)) = fills.last_mut() {
                    fill.bg_color = Some(color(e)?);
                }
            }

            (Section::Borders, b"border") => borders.push(Border::default()),
            (Section::Borders, b"color") => {
                if let (Some(edge), Some(border)) = (side, borders.last_mut()) {
                    if let Some(line) = edge.of(border) {
                        line.color = Some(color(e)?);
                    }
                }
            }
            (Section::Borders, tag) => {
                let edge = Side::from_tag(tag);
                if let (Some(edge), Some(border)) = (edge, borders.last_mut()) {
                    *edge.of(border) = match attr(e, b"style")? {
                        Some(style) if style != "none" => Some(BorderLine { style, color: None }),
                        _ => None,
                    };
                }
                if !empty {
                    side = edge;
                }
            }

            (Section::CellXfs, b"xf") => xfs.push(XfRef {
                num_fmt: number_attr(e, b"numFmtId")?,
                font: number_attr(e, b"fontId")? as usize,
                fill: number_attr(e, b"fillId")? as usize,
                border: number_attr(e, b"borderId")? as usize,
                alignment: Alignment::default(),
            }),
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = xfs.last_mut() {
                    xf.alignment = alignment(e)?;
                }
            }
            _ => {}
        }
    }

    Ok(xfs
        .into_iter()
        .map(|xf| CellFormat {
            number_format: number_format(xf.num_fmt, &num_fmts),
            font: match xf.font {
                0 => Font::default(),
                id => fonts.get(id).cloned().unwrap_or_default(),
            },
            fill: if xf.fill < RESERVED_FILLS {
                None
            } else {
                fills.get(xf.fill).cloned().flatten()
            },
            border: match xf.border {
                0 => Border::default(),
                id => borders.get(id).cloned().unwrap_or_default(),
            },
            alignment: xf.alignment,
        })
        .collect())
}

fn number_format(id: u32, custom: &HashMap<u32, String>) -> Option<String> {
    if id == 0 {
        return None;
    }
    if let Some(code) = custom.get(&id) {
        return Some(code.clone());
    }
    let code = builtin_code(id);
    if code.is_none() {
        log::debug!("number format {} is locale specific, reading as General", id);
    }
    code.map(str::to_string)
}

fn read_font_part(font: &mut Font, tag: &[u8], e: &BytesStart<'_>) -> Result<()> {
    match tag {
        b"b" => font.bold = flag_on(e)?,
        b"i" => font.italic = flag_on(e)?,
        b"strike" => font.strike = flag_on(e)?,
        b"u" => {
            font.underline = match attr(e, b"val")? {
                None => Some("single".to_string()),
                Some(kind) if kind == "none" => None,
                Some(kind) => Some(kind),
            }
        }
        b"sz" => font.size = attr(e, b"val")?.and_then(|v| v.trim().parse().ok()),
        b"color" => font.color = Some(color(e)?),
        b"name" => font.name = attr(e, b"val")?,
        _ => {}
    }
    Ok(())
}

fn color(e: &BytesStart<'_>) -> Result<Color> {
    Ok(Color {
        rgb: attr(e, b"rgb")?.map(|rgb| rgb.to_ascii_uppercase()),
        theme: optional_number(e, b"theme")?,
        indexed: optional_number(e, b"indexed")?,
        tint: attr(e, b"tint")?.and_then(|v| v.trim().parse().ok()),
        auto: attr(e, b"auto")?.is_some_and(|v| v == "1" || v == "true"),
    })
}

fn alignment(e: &BytesStart<'_>) -> Result<Alignment> {
    let on = |value: Option<String>| value.is_some_and(|v| v == "1" || v == "true");
    Ok(Alignment {
        horizontal: attr(e, b"horizontal")?,
        vertical: attr(e, b"vertical")?,
        wrap_text: on(attr(e, b"wrapText")?),
        shrink_to_fit: on(attr(e, b"shrinkToFit")?),
        indent: optional_number(e, b"indent")?.filter(|n| *n > 0),
        text_rotation: optional_number(e, b"textRotation")?.filter(|n| *n > 0),
    })
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attribute in e.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn optional_number(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<u32>> {
    Ok(attr(e, name)?.and_then(|v| v.trim().parse().ok()))
}

fn number_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<u32> {
    Ok(optional_number(e, name)?.unwrap_or(0))
}

// `<b/>` is on; `<b val="0"/>` or `val="false"` is off
fn flag_on(e: &BytesStart<'_>) -> Result<bool> {
    Ok(!matches!(attr(e, b"val")?.as_deref(), Some("0") | Some("false")))
}

struct XfEntry {
    num_fmt: u32,
    font: usize,
    fill: usize,
    border: usize,
    alignment: Alignment,
}

/// Formats interned for one package, numbered in first-seen order
///
/// Index 0 of `cellXfs` is always the default format.
#[derive(Default)]
pub(crate) struct StyleTable {
    num_fmts: Vec<(u32, String)>,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    xfs: Vec<XfEntry>,
    // serialized format -> `cellXfs` index
    lookup: HashMap<String, u32>,
}

fn intern<T: PartialEq + Clone>(items: &mut Vec<T>, item: &T) -> usize {
    match items.iter().position(|existing| existing == item) {
        Some(index) => index,
        None => {
            items.push(item.clone());
            items.len() - 1
        }
    }
}

impl StyleTable {
    pub fn new() -> Self {
        StyleTable::default()
    }

    /// `cellXfs` index for `format`, adding it on first use
    pub fn add(&mut self, format: &CellFormat) -> Result<u32> {
        if format.is_default() {
            return Ok(0);
        }
        let key = serde_json::to_string(format)?;
        if let Some(&index) = self.lookup.get(&key) {
            return Ok(index);
        }

        let num_fmt = match &format.number_format {
            None => 0,
            Some(code) => match builtin_id(code) {
                Some(id) => id,
                None => self.custom_num_fmt(code),
            },
        };
        let font = if format.font.is_default() {
            0
        } else {
            intern(&mut self.fonts, &format.font) + 1
        };
        let fill = match &format.fill {
            None => 0,
            Some(fill) => intern(&mut self.fills, fill) + RESERVED_FILLS,
        };
        let border = if format.border.is_default() {
            0
        } else {
            intern(&mut self.borders, &format.border) + 1
        };

        self.xfs.push(XfEntry {
            num_fmt,
            font,
            fill,
            border,
            alignment: format.alignment.clone(),
        });
        let index = self.xfs.len() as u32;
        self.lookup.insert(key, index);
        Ok(index)
    }

    fn custom_num_fmt(&mut self, code: &str) -> u32 {
        if let Some((id, _)) = self.num_fmts.iter().find(|(_, known)| known == code) {
            return *id;
        }
        let id = FIRST_CUSTOM_NUM_FMT + self.num_fmts.len() as u32;
        self.num_fmts.push((id, code.to_string()));
        id
    }

    /// Write `xl/styles.xml`
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.write_str(XML_DECLARATION)?;
        writer.start_element("styleSheet")?;
        writer.attribute("xmlns", MAIN_NS)?;
        writer.close_start_tag()?;

        if !self.num_fmts.is_empty() {
            writer.start_element("numFmts")?;
            writer.attribute_int("count", self.num_fmts.len())?;
            writer.close_start_tag()?;
            for (id, code) in &self.num_fmts {
                writer.start_element("numFmt")?;
                writer.attribute_int("numFmtId", *id)?;
                writer.attribute("formatCode", code)?;
                writer.close_empty()?;
            }
            writer.end_element("numFmts")?;
        }

        writer.start_element("fonts")?;
        writer.attribute_int("count", self.fonts.len() + 1)?;
        writer.close_start_tag()?;
        writer.write_str("<font><sz val=\"11\"/><name val=\"Calibri\"/><family val=\"2\"/></font>")?;
        for font in &self.fonts {
            write_font(writer, font)?;
        }
        writer.end_element("fonts")?;

        writer.start_element("fills")?;
        writer.attribute_int("count", self.fills.len() + RESERVED_FILLS)?;
        writer.close_start_tag()?;
        writer.write_str(
            "<fill><patternFill patternType=\"none\"/></fill>\
<fill><patternFill patternType=\"gray125\"/></fill>",
        )?;
        for fill in &self.fills {
            write_fill(writer, fill)?;
        }
        writer.end_element("fills")?;

        writer.start_element("borders")?;
        writer.attribute_int("count", self.borders.len() + 1)?;
        writer.close_start_tag()?;
        writer.write_str("<border><left/><right/><top/><bottom/><diagonal/></border>")?;
        for border in &self.borders {
            write_border(writer, border)?;
        }
        writer.end_element("borders")?;

        writer.write_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        )?;

        writer.start_element("cellXfs")?;
        writer.attribute_int("count", self.xfs.len() + 1)?;
        writer.close_start_tag()?;
        writer.write_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>")?;
        for xf in &self.xfs {
            write_xf(writer, xf)?;
        }
        writer.end_element("cellXfs")?;

        writer.write_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        )?;
        writer.end_element("styleSheet")?;
        writer.flush()
    }
}

fn write_color<W: Write>(writer: &mut XmlWriter<W>, tag: &str, color: &Color) -> Result<()> {
    writer.start_element(tag)?;
    if color.auto {
        writer.attribute("auto", "1")?;
    }
    if let Some(indexed) = color.indexed {
        writer.attribute_int("indexed", indexed)?;
    }
    if let Some(rgb) = &color.rgb {
        writer.attribute("rgb", rgb)?;
    }
    if let Some(theme) = color.theme {
        writer.attribute_int("theme", theme)?;
    }
    if let Some(tint) = color.tint {
        writer.attribute("tint", &tint.to_string())?;
    }
    writer.close_empty()
}

fn write_font<W: Write>(writer: &mut XmlWriter<W>, font: &Font) -> Result<()> {
    writer.write_str("<font>")?;
    if font.bold {
        writer.write_str("<b/>")?;
    }
    if font.italic {
        writer.write_str("<i/>")?;
    }
    if font.strike {
        writer.write_str("<strike/>")?;
    }
    if let Some(kind) = &font.underline {
        writer.start_element("u")?;
        if kind != "single" {
            writer.attribute("val", kind)?;
        }
        writer.close_empty()?;
    }
    if let Some(size) = font.size {
        writer.start_element("sz")?;
        writer.attribute("val", &size.to_string())?;
        writer.close_empty()?;
    }
    if let Some(color) = &font.color {
        write_color(writer, "color", color)?;
    }
    if let Some(name) = &font.name {
        writer.start_element("name")?;
        writer.attribute("val", name)?;
        writer.close_empty()?;
    }
    writer.end_element("font")
}

fn write_fill<W: Write>(writer: &mut XmlWriter<W>, fill: &Fill) -> Result<()> {
    writer.write_str("<fill>")?;
    writer.start_element("patternFill")?;
    writer.attribute("patternType", &fill.pattern)?;
    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        writer.close_empty()?;
    } else {
        writer.close_start_tag()?;
        if let Some(color) = &fill.fg_color {
            write_color(writer, "fgColor", color)?;
        }
        if let Some(color) = &fill.bg_color {
            write_color(writer, "bgColor", color)?;
        }
        writer.end_element("patternFill")?;
    }
    writer.end_element("fill")
}

fn write_border<W: Write>(writer: &mut XmlWriter<W>, border: &Border) -> Result<()> {
    writer.write_str("<border>")?;
    for (tag, line) in [
        ("left", &border.left),
        ("right", &border.right),
        ("top", &border.top),
        ("bottom", &border.bottom),
    ] {
        writer.start_element(tag)?;
        match line {
            None => writer.close_empty()?,
            Some(line) => {
                writer.attribute("style", &line.style)?;
                match &line.color {
                    None => writer.close_empty()?,
                    Some(color) => {
                        writer.close_start_tag()?;
                        write_color(writer, "color", color)?;
                        writer.end_element(tag)?;
                    }
                }
            }
        }
    }
    writer.write_str("<diagonal/>")?;
    writer.end_element("border")
}

fn write_xf<W: Write>(writer: &mut XmlWriter<W>, xf: &XfEntry) -> Result<()> {
    writer.start_element("xf")?;
    writer.attribute_int("numFmtId", xf.num_fmt)?;
    writer.attribute_int("fontId", xf.font)?;
    writer.attribute_int("fillId", xf.fill)?;
    writer.attribute_int("borderId", xf.border)?;
    writer.attribute("xfId", "0")?;
    if xf.num_fmt != 0 {
        writer.attribute("applyNumberFormat", "1")?;
    }
    if xf.font != 0 {
        writer.attribute("applyFont", "1")?;
    }
    if xf.fill != 0 {
        writer.attribute("applyFill", "1")?;
    }
    if xf.border != 0 {
        writer.attribute("applyBorder", "1")?;
    }
    if xf.alignment.is_default() {
        return writer.close_empty();
    }

    writer.attribute("applyAlignment", "1")?;
    writer.close_start_tag()?;
    let alignment = &xf.alignment;
    writer.start_element("alignment")?;
    if let Some(horizontal) = &alignment.horizontal {
        writer.attribute("horizontal", horizontal)?;
    }
    if let Some(vertical) = &alignment.vertical {
        writer.attribute("vertical", vertical)?;
    }
    if let Some(rotation) = alignment.text_rotation {
        writer.attribute_int("textRotation", rotation)?;
    }
    if alignment.wrap_text {
        writer.attribute("wrapText", "1")?;
    }
    if let Some(indent) = alignment.indent {
        writer.attribute_int("indent", indent)?;
    }
    if alignment.shrink_to_fit {
        writer.attribute("shrinkToFit", "1")?;
    }
    writer.close_empty()?;
    writer.end_element("xf")
}
