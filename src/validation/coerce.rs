//! Lenient field decoding shared by JSON bodies and HTML form posts.
//!
//! Form posts deliver every value as text, and a checkbox paired with a
//! hidden fallback input arrives as a repeated key, so decoders take the
//! last element of an array.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn last(value: Value) -> Value {
    match value {
        Value::Array(mut items) => items.pop().unwrap_or(Value::Null),
        other => other,
    }
}

/// Text field; blank input reads as absent.
pub fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?.map(last);
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected text, found {}", other))),
    }
}

/// Boolean field accepting `true/false`, `on/off`, `yes/no` and `1/0`.
pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(deserializer)?.map(last) {
        None => Ok(None),
        Some(value) => parse_flag(&value).map_err(D::Error::custom),
    }
}

/// Whole number; form posts send it as text.
pub fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)?.map(last) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a whole number, found {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a whole number, found '{}'", s.trim()))),
        Some(other) => Err(D::Error::custom(format!("expected a whole number, found {}", other))),
    }
}

pub fn parse_flag(value: &Value) -> Result<Option<bool>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(format!("expected a boolean, found {}", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "on" | "yes" | "1" => Ok(Some(true)),
            "false" | "off" | "no" | "0" => Ok(Some(false)),
            other => Err(format!("expected a boolean, found '{}'", other)),
        },
        other => Err(format!("expected a boolean, found {}", other)),
    }
}

/// Lowercase, hyphen-separated form of a title: `"Hello, World!"` becomes `hello-world`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "optional_text")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "lenient_int")]
        count: Option<i64>,
    }

    fn sample(value: Value) -> Result<Sample, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn flags_accept_form_spellings() {
        for (raw, expected) in [
            (json!("on"), Some(true)),
            (json!("OFF"), Some(false)),
            (json!("1"), Some(true)),
            (json!(0), Some(false)),
            (json!(true), Some(true)),
            (json!(""), None),
            (json!(["off", "on"]), Some(true)),
        ] {
            assert_eq!(sample(json!({ "flag": raw })).unwrap().flag, expected);
        }
        assert!(sample(json!({ "flag": "maybe" })).is_err());
        assert_eq!(sample(json!({})).unwrap().flag, None);
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(sample(json!({ "text": "   " })).unwrap().text, None);
        assert_eq!(sample(json!({ "text": 42 })).unwrap().text.as_deref(), Some("42"));
        assert!(sample(json!({ "text": { "nested": true } })).is_err());
    }

    #[test]
    fn whole_numbers_accept_form_text() {
        assert_eq!(sample(json!({ "count": "12" })).unwrap().count, Some(12));
        assert_eq!(sample(json!({ "count": [" 3 ", "7"] })).unwrap().count, Some(7));
        assert_eq!(sample(json!({ "count": -2 })).unwrap().count, Some(-2));
        assert_eq!(sample(json!({ "count": "" })).unwrap().count, None);
        assert!(sample(json!({ "count": "1.5" })).is_err());
        assert!(sample(json!({ "count": 2.5 })).is_err());
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  AI-powered  Tutor 2.0 "), "ai-powered-tutor-2-0");
        assert_eq!(slugify("!!!"), "");
    }
}
