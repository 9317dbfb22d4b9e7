use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Write body accepted as JSON or as an HTML form post.
///
/// Form fields become strings; a key sent more than once becomes an array
/// in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for InputBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge("Request body is too large".to_string())
            } else {
                ApiError::bad_request(rejection.body_text())
            }
        })?;

        if is_form {
            Ok(InputBody(decode_form(&bytes)))
        } else {
            decode_json(&bytes).map(InputBody)
        }
    }
}

fn decode_json(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::invalid_json("Request body is empty"));
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::invalid_json(format!("Invalid JSON: {}", e)))
}

pub fn decode_form(bytes: &[u8]) -> Value {
    let mut object = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(object)
}

/// Overlay `extra` keys that the body does not already carry.
pub fn merge_missing(body: Value, extra: impl IntoIterator<Item = (String, String)>) -> Value {
    let mut object = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in extra {
        object.entry(key).or_insert(Value::String(value));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    #[test]
    fn repeated_form_keys_become_arrays() {
        let value = decode_form(b"title=Buy+milk&is_active=off&is_active=on&ids=1&ids=2&ids=3");
        assert_eq!(
            value,
            json!({ "title": "Buy milk", "is_active": ["off", "on"], "ids": ["1", "2", "3"] })
        );
    }

    #[test]
    fn query_values_fill_gaps_only() {
        let merged = merge_missing(
            json!({ "action": "delete" }),
            vec![("action".to_string(), "activate".to_string()), ("ids".to_string(), "4".to_string())],
        );
        assert_eq!(merged, json!({ "action": "delete", "ids": "4" }));
    }

    #[tokio::test]
    async fn extracts_json_and_forms() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"x"}"#))
            .unwrap();
        assert_eq!(InputBody::from_request(req, &()).await.unwrap().0, json!({ "title": "x" }));

        let req = Request::builder()
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=UTF-8")
            .body(Body::from("title=y"))
            .unwrap();
        assert_eq!(InputBody::from_request(req, &()).await.unwrap().0, json!({ "title": "y" }));

        let req = Request::builder().body(Body::from("{nope")).unwrap();
        assert_eq!(InputBody::from_request(req, &()).await.unwrap_err().error_code(), "INVALID_JSON");
    }
}
