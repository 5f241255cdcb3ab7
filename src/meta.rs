//! Ordered metadata table stored in the `_meta` sheet

use crate::error::Result;
use crate::styles::StyleSheet;
use chrono::{NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde_json::Value;

/// Key rewritten with the save timestamp; always the first entry
pub const MODIFIED: &str = "modified";

/// Creation timestamp key; always right after `modified`
pub const CREATED: &str = "created";

/// Key holding the extracted style blob
pub const STYLES: &str = "_styles";

/// Name of the sheet that carries the metadata table
pub const META_SHEET: &str = "_meta";

/// Render a timestamp the way it is stored under `modified`
///
/// The fraction is cut to microseconds and left out when it is zero.
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    let seconds = time.format("%Y-%m-%dT%H:%M:%S");
    // leap seconds report nanoseconds past 1e9
    let micros = (time.nanosecond() % 1_000_000_000) / 1_000;
    if micros == 0 {
        seconds.to_string()
    } else {
        format!("{}.{:06}", seconds, micros)
    }
}

/// Ordered key/value metadata table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    entries: IndexMap<String, Value>,
}

impl Meta {
    /// Create an empty table
    pub fn new() -> Self {
        Meta::default()
    }

    /// Create a table pre-filled with default entries
    pub fn with_defaults<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Meta {
            entries: defaults.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Set a value; an existing key keeps its position
    pub fn set<K: Into<String>>(&mut self, key: K, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a key, keeping the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.entries.keys()
    }

    /// Move `key` to the front; no-op when absent
    pub fn move_to_front(&mut self, key: &str) {
        if let Some(index) = self.entries.get_index_of(key) {
            self.entries.move_index(index, 0);
        }
    }

    /// Put `modified` first and `created` second, skipping whichever is absent
    pub fn pin_timestamps(&mut self) {
        self.move_to_front(CREATED);
        self.move_to_front(MODIFIED);
    }

    /// Record `now` under `modified` and restore the head ordering
    pub fn stamp_modified(&mut self, now: &NaiveDateTime) {
        self.set(MODIFIED, Value::String(format_timestamp(now)));
        self.pin_timestamps();
    }

    /// Style blob stored under `_styles`, if any
    ///
    /// A blob that does not deserialize is treated as absent.
    pub fn styles(&self) -> Option<StyleSheet> {
        let value = self.get(STYLES)?;
        match StyleSheet::from_value(value) {
            Ok(styles) => Some(styles),
            Err(e) => {
                log::warn!("ignoring unreadable {} entry: {}", STYLES, e);
                None
            }
        }
    }

    pub fn set_styles(&mut self, styles: &StyleSheet) -> Result<()> {
        self.set(STYLES, styles.to_value()?);
        Ok(())
    }

    /// Emit the table as `[key, value]` rows
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        self.entries
            .iter()
            .map(|(k, v)| vec![Value::String(k.clone()), v.clone()])
            .collect()
    }

    /// Emit rows for a workbook, where a cell only holds text or a number
    ///
    /// Every value, strings included, is wrapped as `{"key": value}` JSON text so
    /// its kind and any nesting survive; [`Meta::from_rows`] unwraps it.
    pub fn to_workbook_rows(&self) -> Vec<Vec<Value>> {
        self.entries
            .iter()
            .map(|(k, v)| {
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(k.clone(), v.clone());
                let cell = Value::String(Value::Object(wrapper).to_string());
                vec![Value::String(k.clone()), cell]
            })
            .collect()
    }

    /// Merge `[key, value]` rows into the table
    ///
    /// Ingestion stops at the first row that is empty or has an empty key.
    pub fn from_rows(&mut self, rows: &[Vec<Value>]) {
        for (index, row) in rows.iter().enumerate() {
            let key = match row.first() {
                Some(cell) if !is_blank(cell) => key_text(cell),
                _ => {
                    let skipped = rows[index + 1..]
                        .iter()
                        .filter(|r| r.iter().any(|c| !is_blank(c)))
                        .count();
                    if skipped > 0 {
                        log::warn!(
                            "metadata ends at row {}; {} later row(s) ignored",
                            index + 1,
                            skipped
                        );
                    }
                    break;
                }
            };

            let value = row.get(1).map(unwrap_value).unwrap_or(Value::Null);
            self.entries.insert(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a Meta {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn key_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Unwrap `{"key": value}` text written by `to_workbook_rows`
fn unwrap_value(cell: &Value) -> Value {
    if let Value::String(text) = cell {
        if text.trim_start().starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
                if map.len() == 1 {
                    if let Some((_, inner)) = map.into_iter().next() {
                        return inner;
                    }
                }
            }
        }
    }
    cell.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_move_to_front_is_idempotent() {
        let mut meta = Meta::with_defaults([("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);
        meta.move_to_front("c");
        meta.move_to_front("c");
        meta.move_to_front("missing");
        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_stamp_orders_modified_then_created() {
        let mut meta = Meta::new();
        meta.set("author", json!("me"));
        meta.set(CREATED, json!("2020-01-01T00:00:00"));
        meta.stamp_modified(&at(10, 30, 0));

        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec![MODIFIED, CREATED, "author"]);
        assert_eq!(meta.get(MODIFIED), Some(&json!("2024-05-06T10:30:00")));
    }

    #[test]
    fn test_stamp_without_created() {
        let mut meta = Meta::with_defaults([("x", json!(null))]);
        meta.stamp_modified(&at(1, 2, 3));
        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec![MODIFIED, "x"]);
    }

    #[test]
    fn test_timestamp_stops_at_microseconds() {
        let time = at(16, 24, 30).with_nanosecond(622_539_797).unwrap();
        assert_eq!(format_timestamp(&time), "2024-05-06T16:24:30.622539");

        let time = at(16, 24, 30).with_nanosecond(250_000).unwrap();
        assert_eq!(format_timestamp(&time), "2024-05-06T16:24:30.000250");

        let time = at(16, 24, 30).with_nanosecond(999).unwrap();
        assert_eq!(format_timestamp(&time), "2024-05-06T16:24:30");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut meta = Meta::with_defaults([("a", json!(1)), ("b", json!(2))]);
        meta.set("a", json!(10));
        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(meta.get("a"), Some(&json!(10)));
    }

    #[test]
    fn test_from_rows_merges_and_unwraps() {
        let mut meta = Meta::with_defaults([("default", json!("kept")), ("n", json!(0))]);
        meta.from_rows(&[
            vec![json!("n"), json!("{\"n\": 5}")],
            vec![json!("tags"), json!("{\"tags\": [\"a\", \"b\"]}")],
            vec![json!("plain"), json!("{not json")],
            vec![json!("lonely")],
        ]);

        assert_eq!(meta.get("default"), Some(&json!("kept")));
        assert_eq!(meta.get("n"), Some(&json!(5)));
        assert_eq!(meta.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(meta.get("plain"), Some(&json!("{not json")));
        assert_eq!(meta.get("lonely"), Some(&json!(null)));
    }

    #[test]
    fn test_from_rows_stops_at_sentinel() {
        let mut meta = Meta::new();
        meta.from_rows(&[
            vec![json!("a"), json!(1)],
            vec![json!(""), json!("orphan")],
            vec![json!("b"), json!(2)],
        ]);
        assert!(meta.contains_key("a"));
        assert!(!meta.contains_key("b"));

        let mut meta = Meta::new();
        meta.from_rows(&[vec![json!("a"), json!(1)], vec![], vec![json!("b"), json!(2)]]);
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_multi_key_object_is_not_unwrapped() {
        let mut meta = Meta::new();
        meta.from_rows(&[vec![json!("k"), json!("{\"a\": 1, \"b\": 2}")]]);
        assert_eq!(meta.get("k"), Some(&json!("{\"a\": 1, \"b\": 2}")));
    }

    #[test]
    fn test_workbook_rows_round_trip() {
        let source = Meta::with_defaults([
            ("title", json!("Report")),
            ("version", json!(3)),
            ("draft", json!(false)),
            ("empty", json!(null)),
            ("nested", json!({"x": [1, 2]})),
            ("note", json!("{\"a\": 1}")),
        ]);

        let mut restored = Meta::new();
        restored.from_rows(&source.to_workbook_rows());
        assert_eq!(restored, source);
    }

    #[test]
    fn test_workbook_rows_wrap_strings() {
        let meta = Meta::with_defaults([("title", json!("Report"))]);
        assert_eq!(
            meta.to_workbook_rows(),
            vec![vec![json!("title"), json!("{\"title\":\"Report\"}")]]
        );
    }

    #[test]
    fn test_to_rows_pairs() {
        let meta = Meta::with_defaults([("a", json!(1))]);
        assert_eq!(meta.to_rows(), vec![vec![json!("a"), json!(1)]]);
    }
}
