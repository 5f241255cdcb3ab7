//! Row mapping between the canonical model and each format's native rows

use crate::codec;
use crate::format::Format;
use serde_json::Value;

/// Convert a row into the representation stored by `format`
pub fn project_out(row: &[Value], format: Format) -> Vec<Value> {
    if format.is_type_preserving() {
        row.iter().map(codec::encode).collect()
    } else {
        row.to_vec()
    }
}

/// Convert a metadata row; the key in the first cell stays a plain string
pub fn project_meta_out(row: &[Value], format: Format) -> Vec<Value> {
    match row.split_first() {
        Some((key, rest)) if format.is_type_preserving() => {
            let mut out = Vec::with_capacity(row.len());
            out.push(key.clone());
            out.extend(rest.iter().map(codec::encode));
            out
        }
        _ => row.to_vec(),
    }
}

/// Convert a stored row back into raw values
pub fn project_in(row: &[Value], format: Format) -> Vec<Value> {
    if format.is_type_preserving() {
        row.iter().map(codec::decode).collect()
    } else {
        row.to_vec()
    }
}
