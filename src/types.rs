/// Shared types used across the codebase

use serde_json::{Map, Value};

/// One record as fetched from a table: column name to JSON value.
pub type Row = Map<String, Value>;

/// String form of a row id, whatever its JSON type.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
