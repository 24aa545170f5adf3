// src/utils/serialization.rs
//! Serialization helpers shared by the HTTP layer and the store client.

use serde::{Deserialize, Serialize};
use serde_json;

/// Serializes a value to a JSON string.
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
///
/// # Note
/// The lifetime parameter lets the result borrow from the input string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Returns the first value among `names` found in a form-encoded string.
///
/// Names are tried in order; for each name the first occurrence wins.
pub fn first_form_value(encoded: &str, names: &[&str]) -> Option<String> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect();
    names.iter().find_map(|name| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    })
}

/// Returns the first string field among `names` in a JSON object.
pub fn first_json_string(value: &serde_json::Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| value.get(name).and_then(|v| v.as_str()).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_form_value_prefers_earlier_name() {
        let encoded = "init_data=second&initData=first%20value";
        assert_eq!(
            first_form_value(encoded, &["initData", "init_data"]).as_deref(),
            Some("first value")
        );
        assert_eq!(
            first_form_value("init_data=x", &["initData", "init_data"]).as_deref(),
            Some("x")
        );
        assert!(first_form_value("other=1", &["initData"]).is_none());
    }

    #[test]
    fn test_first_form_value_takes_first_occurrence() {
        assert_eq!(
            first_form_value("initData=a&initData=b", &["initData"]).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_first_json_string_ignores_non_strings() {
        let body = json!({ "initData": 5, "init_data": "raw" });
        assert_eq!(
            first_json_string(&body, &["initData", "init_data"]).as_deref(),
            Some("raw")
        );
        assert!(first_json_string(&json!(["initData"]), &["initData"]).is_none());
    }

    #[test]
    fn test_json_round_trip_helpers() {
        let value: serde_json::Value = deserialize(r#"{"ok":true}"#).unwrap();
        assert_eq!(serialize(&value).unwrap(), r#"{"ok":true}"#);
    }
}
