//! Type-preserving cell tokens
//!
//! Formats that store every cell as text lose the difference between `1`, `"1"`,
//! `true` and `null`. Each cell is therefore stored as the JSON text of a
//! one-element array holding the scalar, e.g. `[1]`, `["1"]`, `[true]`, `[null]`.
//! Decoding parses that literal and takes its sole element.

use serde_json::Value;

/// Encode a value as a type-preserving token
pub fn encode(value: &Value) -> Value {
    let literal = Value::Array(vec![value.clone()]);
    Value::String(literal.to_string())
}

/// Decode a stored token
///
/// Tokens that are not a one-element array literal are returned as plain strings,
/// so legacy or hand-edited files still load. Tokens that are already typed
/// (numbers, booleans, nested values) are returned unchanged.
pub fn decode(token: &Value) -> Value {
    match token {
        Value::String(text) if text.is_empty() => Value::Null,
        Value::String(text) => decode_str(text).unwrap_or_else(|| token.clone()),
        other => other.clone(),
    }
}

/// Decode a token held as text, `None` when it is not a type-preserving literal
pub fn decode_str(text: &str) -> Option<Value> {
    if !text.trim_start().starts_with('[') {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(mut items)) if items.len() == 1 => items.pop(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_keeps_scalar_kind() {
        assert_eq!(encode(&json!(1)), json!("[1]"));
        assert_eq!(encode(&json!("1")), json!("[\"1\"]"));
        assert_eq!(encode(&json!(true)), json!("[true]"));
        assert_eq!(encode(&json!(null)), json!("[null]"));
        assert_eq!(encode(&json!(1.5)), json!("[1.5]"));
    }

    #[test]
    fn test_decode_literal() {
        assert_eq!(decode(&json!("[1]")), json!(1));
        assert_eq!(decode(&json!("[\"1\"]")), json!("1"));
        assert_eq!(decode(&json!("[false]")), json!(false));
        assert_eq!(decode(&json!("[null]")), json!(null));
        assert_eq!(decode(&json!("[{\"a\": 1}]")), json!({"a": 1}));
    }

    #[test]
    fn test_decode_falls_back_to_string() {
        for raw in ["hello", "42", "true", "[1, 2]", "[", "{\"a\": 1}", "[]"] {
            assert_eq!(decode(&json!(raw)), json!(raw), "token {raw:?}");
        }
    }

    #[test]
    fn test_decode_empty_and_native_tokens() {
        assert_eq!(decode(&json!("")), json!(null));
        assert_eq!(decode(&json!(null)), json!(null));
        assert_eq!(decode(&json!(7)), json!(7));
        assert_eq!(decode(&json!(true)), json!(true));
    }

    #[test]
    fn test_string_that_looks_encoded_survives() {
        let tricky = json!("[1]");
        assert_eq!(decode(&encode(&tricky)), tricky);
    }
}
