//! Input rules for the tables that accept writes through the JSON API.

pub mod coerce;
pub mod ideas;
pub mod todos;
pub mod users;

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;
use crate::types::Row;

pub use ideas::IdeaInput;
pub use todos::TodoInput;
pub use users::UserInput;

/// A writable entity: its table, its required fields and its create defaults.
///
/// Every field of an input struct is optional so the same type serves
/// partial updates; absent fields are skipped when serializing.
pub trait Resource: DeserializeOwned + Serialize + Validate + Send + 'static {
    const TABLE: &'static str;
    const REQUIRED: &'static [&'static str];

    fn apply_defaults(&mut self) {}
}

/// Decode, default and validate a create body into the row to insert.
pub fn for_create<R: Resource>(body: Value) -> Result<Row, ApiError> {
    let mut input: R = decode(body)?;
    input.apply_defaults();

    let mut errors = input.validate().err().unwrap_or_else(ValidationErrors::new);
    let row = to_row(&input)?;
    for &field in R::REQUIRED {
        if !row.contains_key(field) {
            errors.add(field, rule("required", "This field is required"));
        }
    }

    if errors.is_empty() {
        Ok(row)
    } else {
        Err(errors.into())
    }
}

/// Decode and validate an update body; only the fields present are returned.
pub fn for_update<R: Resource>(body: Value) -> Result<Row, ApiError> {
    let input: R = decode(body)?;
    input.validate()?;
    to_row(&input)
}

fn decode<R: Resource>(body: Value) -> Result<R, ApiError> {
    if !body.is_object() {
        return Err(ApiError::invalid_json("Request body must be an object"));
    }
    serde_json::from_value(body).map_err(|e| ApiError::invalid_json(format!("Invalid request body: {}", e)))
}

fn to_row<R: Resource>(input: &R) -> Result<Row, ApiError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(ApiError::internal_server_error("Failed to prepare record")),
        Err(e) => {
            tracing::error!("Failed to serialize {} input: {}", R::TABLE, e);
            Err(ApiError::internal_server_error("Failed to prepare record"))
        }
    }
}

/// A rule failure with a fixed, user-facing message.
pub(crate) fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Membership check for enumerated text fields.
pub(crate) fn one_of(value: &str, allowed: &[&str], message: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(rule("one_of", message))
    }
}
