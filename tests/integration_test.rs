//! Integration tests for excelport

use chrono::{NaiveDate, NaiveDateTime};
use excelport::meta::{CREATED, MODIFIED, STYLES};
use excelport::{
    CellFormat, CellRef, CellStyle, CellValue, Color, ExcelError, Format, Meta, SaveOptions,
    StyleSheet, Workbook,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SOURCE: &str = r#"{"_meta":[["created","2020-01-01T00:00:00"]], "Sheet1":[[1,"a",true]]}"#;

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_micro_opt(12, 30, 0, 250)
        .unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn read_yaml(path: &Path) -> Value {
    serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn top_keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

#[test]
fn test_type_preserving_json_to_yaml() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.pyexcel.json");
    let output = dir.path().join("out.yaml");
    std::fs::write(&input, SOURCE).unwrap();

    let mut book = Workbook::open(&input).unwrap();
    book.save_at(&output, &SaveOptions::default(), noon()).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.find("_meta").unwrap() < text.find("Sheet1").unwrap());

    let yaml = read_yaml(&output);
    assert_eq!(top_keys(&yaml), vec!["_meta", "Sheet1"]);
    assert_eq!(
        yaml["_meta"],
        json!([
            ["modified", "2024-05-17T12:30:00.000250"],
            ["created", "2020-01-01T00:00:00"]
        ])
    );
    assert_eq!(yaml["Sheet1"], json!([[1, "a", true]]));
    assert!(yaml["Sheet1"][0][0].is_i64());
    assert!(yaml["Sheet1"][0][2].is_boolean());
}

#[test]
fn test_type_preserving_json_back_to_itself() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.pyexcel.json");
    let output = dir.path().join("out.pyexcel.json");
    std::fs::write(&input, SOURCE).unwrap();

    let mut book = Workbook::open(&input).unwrap();
    book.save_at(&output, &SaveOptions::default(), noon()).unwrap();

    let stored = read_json(&output);
    assert_eq!(stored["Sheet1"], json!([["[1]", "[\"a\"]", "[true]"]]));
    assert_eq!(stored["_meta"][0][0], json!("modified"));
    assert_eq!(stored["_meta"][1], json!(["created", "[\"2020-01-01T00:00:00\"]"]));

    let reloaded = Workbook::open(&output).unwrap();
    assert_eq!(
        reloaded.sheet("Sheet1"),
        Some(&vec![vec![
            CellValue::Int(1),
            CellValue::from("a"),
            CellValue::Bool(true)
        ]])
    );
    assert_eq!(
        reloaded.meta().get(CREATED),
        Some(&json!("2020-01-01T00:00:00"))
    );
    assert_eq!(
        reloaded.meta().get(MODIFIED),
        Some(&json!("2024-05-17T12:30:00.000250"))
    );
}

#[test]
fn test_every_scalar_kind_survives_type_preserving_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kinds.pyexcel.json");

    let row = vec![
        CellValue::Null,
        CellValue::Bool(false),
        CellValue::Int(-7),
        CellValue::Float(1.5),
        CellValue::Float(2.0),
        CellValue::from("1"),
        CellValue::from("true"),
        CellValue::from(""),
        CellValue::from("[1]"),
    ];
    let mut book = Workbook::new();
    book.insert_sheet("Kinds", vec![row.clone(), vec![]]);
    book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let reloaded = Workbook::open(&path).unwrap();
    assert_eq!(reloaded.sheet("Kinds"), Some(&vec![row, vec![]]));
}

#[test]
fn test_reserved_sheets_are_dropped_in_every_format() {
    let dir = tempdir().unwrap();
    let mut book = Workbook::new();
    book.insert_sheet("_scratch", vec![vec![CellValue::Int(1)]]);
    book.insert_sheet("Data", vec![vec![CellValue::Int(2)]]);

    for name in ["out.json", "out.pyexcel.json", "out.yaml", "out.xlsx"] {
        let path = dir.path().join(name);
        book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

        let reloaded = Workbook::open(&path).unwrap();
        let sheets: Vec<&str> = reloaded.sheets().keys().map(String::as_str).collect();
        assert_eq!(sheets, vec!["Data"], "{}", name);
    }

    assert!(book.sheet("_scratch").is_some());
}

#[test]
fn test_modified_then_created_after_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.json");

    let mut meta = Meta::new();
    meta.set("title", json!("Quarterly"));
    meta.set(CREATED, json!("2019-12-31T23:59:59"));
    meta.set("tags", json!(["a", "b"]));
    let mut book = Workbook::with_meta(meta);
    book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let stored = read_json(&path);
    let keys: Vec<&str> = stored["_meta"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row[0].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec![MODIFIED, CREATED, "title", "tags"]);

    let reloaded = Workbook::open(&path).unwrap();
    let keys: Vec<&str> = reloaded.meta().keys().map(String::as_str).collect();
    assert_eq!(keys, vec![MODIFIED, CREATED, "title", "tags"]);
    assert_eq!(reloaded.meta().get("tags"), Some(&json!(["a", "b"])));
}

#[test]
fn test_workbook_round_trip_of_meta_and_cells() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut book = Workbook::new();
    book.meta_mut().set("title", json!("Budget"));
    book.meta_mut().set("version", json!(3));
    book.meta_mut().set("draft", json!(false));
    book.meta_mut().set("owners", json!({"lead": "kim"}));
    book.meta_mut().set("note", json!(r#"{"a": 1}"#));
    book.insert_sheet(
        "Budget",
        vec![
            vec![CellValue::from("item"), CellValue::from("cost")],
            vec![CellValue::from("rent"), CellValue::Float(1200.5)],
            vec![CellValue::from("fees"), CellValue::Int(40)],
            vec![CellValue::Null, CellValue::Bool(true)],
        ],
    );
    book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let reloaded = Workbook::open(&path).unwrap();
    let names: Vec<&str> = reloaded.sheets().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Budget"]);
    assert_eq!(reloaded.sheet("Budget"), book.sheet("Budget"));

    let meta = reloaded.meta();
    assert_eq!(meta.get("title"), Some(&json!("Budget")));
    assert_eq!(meta.get("version"), Some(&json!(3)));
    assert_eq!(meta.get("draft"), Some(&json!(false)));
    assert_eq!(meta.get("owners"), Some(&json!({"lead": "kim"})));
    assert_eq!(meta.get("note"), Some(&json!(r#"{"a": 1}"#)));
    assert_eq!(
        meta.get(MODIFIED),
        Some(&json!("2024-05-17T12:30:00.000250"))
    );
}

#[test]
fn test_workbook_float_fidelity_is_partial() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut book = Workbook::new();
    book.insert_sheet(
        "S",
        vec![vec![CellValue::Float(2.0), CellValue::from(""), CellValue::Null]],
    );
    book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let reloaded = Workbook::open(&path).unwrap();
    assert_eq!(reloaded.sheet("S"), Some(&vec![vec![CellValue::Int(2)]]));
}

fn styled_book() -> Workbook {
    let mut book = Workbook::new();
    book.insert_sheet(
        "Report",
        vec![
            vec![CellValue::from("name"), CellValue::from("total")],
            vec![CellValue::from("north"), CellValue::Float(10.25)],
        ],
    );
    let mut styles = StyleSheet::new();
    styles.set("Report", CellRef::new(0, 0), CellStyle::HeaderBold);
    styles.set("Report", CellRef::new(0, 1), CellStyle::HeaderBold);
    styles.set("Report", CellRef::new(1, 1), CellStyle::NumberCurrency);
    book.meta_mut().set_styles(&styles).unwrap();
    book
}

#[test]
fn test_styles_travel_through_text_and_back() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.xlsx");
    let text = dir.path().join("middle.pyexcel.json");
    let second = dir.path().join("second.xlsx");

    let mut book = styled_book();
    book.save_at(&first, &SaveOptions::default(), noon()).unwrap();

    let mut loaded = Workbook::open(&first).unwrap();
    let extracted = loaded.meta().styles().unwrap();
    assert_eq!(extracted.len(), 3);
    loaded.save_at(&text, &SaveOptions::default(), noon()).unwrap();

    let mut from_text = Workbook::open(&text).unwrap();
    assert_eq!(from_text.meta().styles(), Some(extracted.clone()));
    from_text.save_at(&second, &SaveOptions::default(), noon()).unwrap();

    assert_eq!(StyleSheet::extract(&second).unwrap(), extracted);
}

#[test]
fn test_style_retention_off() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("plain.json");
    let xlsx_path = dir.path().join("plain.xlsx");
    let options = SaveOptions::new().with_retain_styles(false);

    let mut book = styled_book();
    book.save_at(&json_path, &options, noon()).unwrap();
    let stored = read_json(&json_path);
    assert!(stored["_meta"]
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row[0] != json!(STYLES)));

    book.save_at(&xlsx_path, &options, noon()).unwrap();
    assert!(StyleSheet::extract(&xlsx_path).unwrap().is_empty());

    assert!(book.meta().contains_key(STYLES));
}

#[test]
fn test_styles_merge_with_existing_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("target.xlsx");

    let mut previous = Workbook::new();
    previous.insert_sheet(
        "Report",
        vec![vec![CellValue::from("old"), CellValue::from("older")]],
    );
    let mut old_styles = StyleSheet::new();
    old_styles.set("Report", CellRef::new(0, 0), CellStyle::HighlightRed);
    old_styles.set("Report", CellRef::new(0, 1), CellStyle::TextItalic);
    previous.meta_mut().set_styles(&old_styles).unwrap();
    previous.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let mut incoming = Workbook::new();
    incoming.insert_sheet(
        "Report",
        vec![vec![CellValue::from("new"), CellValue::from("newer")]],
    );
    let mut new_styles = StyleSheet::new();
    new_styles.set("Report", CellRef::new(0, 0), CellStyle::HeaderBold);
    incoming.meta_mut().set_styles(&new_styles).unwrap();
    incoming.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let merged = StyleSheet::extract(&path).unwrap();
    assert_eq!(
        merged.get("Report", CellRef::new(0, 0)),
        Some(&CellFormat::from(CellStyle::HeaderBold))
    );
    assert_eq!(
        merged.get("Report", CellRef::new(0, 1)),
        Some(&CellFormat::from(CellStyle::TextItalic))
    );
}

const FOREIGN_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="3">
<font><sz val="11"/><name val="Calibri"/></font>
<font><b/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
<font><u/><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>
</cellXfs>
</styleSheet>"#;

// A package laid out the way other spreadsheet tools write it
fn write_foreign_workbook(path: &Path) {
    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Styled" sheetId="1" r:id="rId7"/></sheets>
</workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/data.xml"/>
<Relationship Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
        ),
        (
            "xl/worksheets/data.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" s="1" t="inlineStr"><is><t>Total</t></is></c><c r="B1" s="2" t="inlineStr"><is><t>note</t></is></c><c r="C1" s="0"><v>3</v></c></row>
</sheetData></worksheet>"#,
        ),
        ("xl/styles.xml", FOREIGN_STYLES),
    ];

    let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, body) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn test_foreign_workbook_styles_survive_text_round_trip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("foreign.xlsx");
    let text = dir.path().join("foreign.pyexcel.json");
    let copy = dir.path().join("copy.xlsx");
    write_foreign_workbook(&source);

    let mut book = Workbook::open(&source).unwrap();
    assert_eq!(
        book.sheet("Styled"),
        Some(&vec![vec![
            CellValue::from("Total"),
            CellValue::from("note"),
            CellValue::Int(3)
        ]])
    );

    let styles = book.meta().styles().unwrap();
    assert_eq!(styles.len(), 2);
    let total = styles.get("Styled", CellRef::new(0, 0)).unwrap();
    assert!(total.font.bold);
    assert_eq!(total.font.size, Some(14.0));
    assert_eq!(total.font.color, Some(Color::rgb("FFFF0000")));
    assert_eq!(total.font.name.as_deref(), Some("Arial"));
    let note = styles.get("Styled", CellRef::new(0, 1)).unwrap();
    assert_eq!(note.font.underline.as_deref(), Some("single"));
    assert!(!note.font.bold);

    book.save_at(&text, &SaveOptions::default(), noon()).unwrap();
    let stored = read_json(&text);
    let blob = stored["_meta"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row[0] == json!(STYLES))
        .map(|row| excelport::codec::decode(&row[1]))
        .unwrap();
    assert_eq!(blob["Styled"]["A1"]["font"]["name"], json!("Arial"));
    assert_eq!(blob["Styled"]["B1"]["font"]["underline"], json!("single"));

    let mut from_text = Workbook::open(&text).unwrap();
    from_text.save_at(&copy, &SaveOptions::default(), noon()).unwrap();
    assert_eq!(StyleSheet::extract(&copy).unwrap(), styles);
}

#[test]
fn test_unsupported_extension_on_load_and_save() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    std::fs::write(&csv, "a,b\n").unwrap();

    match Workbook::open(&csv) {
        Err(ExcelError::UnsupportedFormat(ext)) => assert_eq!(ext, ".csv"),
        other => panic!("unexpected {:?}", other.map(|b| b.state())),
    }

    let mut book = Workbook::new();
    let err = book
        .save_at(dir.path().join("data.xls"), &SaveOptions::default(), noon())
        .unwrap_err();
    assert!(err.to_string().contains(".xls"));
    assert!(!dir.path().join("data.xls").exists());
}

#[test]
fn test_legacy_plain_cells_decode_as_strings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.pyexcel.json");
    std::fs::write(
        &path,
        r#"{"S": [["plain", "[1, 2]", "7", "[oops", "", 3, null, "[\"x\"]"]]}"#,
    )
    .unwrap();

    let book = Workbook::open(&path).unwrap();
    assert_eq!(
        book.sheet("S"),
        Some(&vec![vec![
            CellValue::from("plain"),
            CellValue::from("[1, 2]"),
            CellValue::from("7"),
            CellValue::from("[oops"),
            CellValue::Null,
            CellValue::Int(3),
            CellValue::Null,
            CellValue::from("x"),
        ]])
    );
}

#[test]
fn test_format_override_ignores_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.txt");

    let mut book = Workbook::new();
    book.insert_sheet("S", vec![vec![CellValue::Int(5)]]);
    book.save_at(&path, &SaveOptions::new().with_format(Format::Yaml), noon())
        .unwrap();

    let yaml = read_yaml(&path);
    assert_eq!(yaml["S"], json!([[5]]));
}

#[test]
fn test_stylesheet_of_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("meta.yaml");
    let mut book = Workbook::new();
    book.meta_mut().set("owner", json!("ops"));
    book.save_at(&path, &SaveOptions::default(), noon()).unwrap();

    let meta = excelport::stylesheet(Some(path.as_path())).unwrap();
    assert_eq!(meta.get("owner"), Some(&json!("ops")));
    assert!(meta.contains_key(MODIFIED));
}
