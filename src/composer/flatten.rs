//! Flattening of nested secret data into dotted property keys.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Flattens `data` so that `{"a": {"b": 1}, "c": [true]}` becomes
/// `a.b = 1` and `c[0] = true`. Nulls are skipped.
pub fn flatten(data: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for (key, value) in data {
        flatten_value(key.clone(), value, &mut properties);
    }
    properties
}

fn flatten_value(key: String, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            out.insert(key, s.clone());
        }
        Value::Bool(_) | Value::Number(_) => {
            out.insert(key, value.to_string());
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(format!("{}[{}]", key, index), item, out);
            }
        }
        Value::Object(fields) => {
            for (field, item) in fields {
                flatten_value(format!("{}.{}", key, field), item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_values() {
        let data = json!({
            "plain": "value",
            "port": 5432,
            "tls": { "enabled": true, "ciphers": ["a", "b"] },
            "missing": null,
        });
        let Value::Object(data) = data else { unreachable!() };

        let properties = flatten(&data);
        assert_eq!(properties.get("plain").map(String::as_str), Some("value"));
        assert_eq!(properties.get("port").map(String::as_str), Some("5432"));
        assert_eq!(properties.get("tls.enabled").map(String::as_str), Some("true"));
        assert_eq!(properties.get("tls.ciphers[1]").map(String::as_str), Some("b"));
        assert!(!properties.contains_key("missing"));
        assert_eq!(properties.len(), 5);
    }
}
