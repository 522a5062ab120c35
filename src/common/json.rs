use serde::Serialize;
use serde_json::{Map, Value};

/// Serializes `value` and returns it as a JSON object.
///
/// Values that don't serialize to an object yield an empty map.
pub fn to_json_map<T: Serialize + ?Sized>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Parses a JSON object. Input that is too short or not an object yields an empty map.
pub fn json_str_to_map(s: &str) -> Map<String, Value> {
    if s.len() < 2 {
        return Map::new();
    }

    match serde_json::from_str(s) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Pretty JSON with two-space indentation, `"{}"` if serialization fails.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
