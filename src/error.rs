use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::database::StoreError;
use crate::filter::FilterError;
use crate::registry::RegistryError;

/// Per-field validation messages, keyed by input name.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Errors that reach the HTTP edge. The message is always safe to show.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// Body could not be decoded, or a field had the wrong JSON type.
    #[error("{0}")]
    InvalidJson(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{message}")]
    UnprocessableEntity { message: String, field_errors: FieldErrors },
    #[error("{0}")]
    InternalServerError(String),
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::UnprocessableEntity { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().0
    }

    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Stable machine-readable code, e.g. `NOT_FOUND`.
    pub fn error_code(&self) -> &'static str {
        self.kind().1
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::NotFound(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::UnprocessableEntity { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// `{success: false, error, code, field_errors?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
        });
        if let Some(field_errors) = self.field_errors() {
            body["field_errors"] = json!(field_errors);
        }
        body
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::UnprocessableEntity { message: message.into(), field_errors }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    pub fn table_not_found(table_name: &str) -> Self {
        ApiError::not_found(format!("Table '{}' not found", table_name))
    }

    pub fn record_not_found(table_name: &str, id: &str) -> Self {
        ApiError::not_found(format!("Record '{}' not found in '{}'", id, table_name))
    }
}

const GENERIC_FAILURE: &str = "An error occurred while processing your request";
const DB_UNAVAILABLE: &str = "Database temporarily unavailable";

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Filter(e) => e.into(),
            StoreError::ConfigMissing(name) => {
                tracing::error!(setting = name, "store is not configured");
                ApiError::service_unavailable(DB_UNAVAILABLE)
            }
            ref e if e.is_unavailable() => {
                tracing::error!(error = %e, "database unavailable");
                ApiError::service_unavailable(DB_UNAVAILABLE)
            }
            StoreError::Sqlx(e) => {
                tracing::error!(error = %e, "database query failed");
                ApiError::internal_server_error("Database error occurred")
            }
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidPattern(e) => {
                tracing::error!(error = %e, "filter pattern did not compile");
                ApiError::internal_server_error(GENERIC_FAILURE)
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        tracing::error!("Table registry error: {}", err);
        ApiError::internal_server_error("Table configuration is invalid")
    }
}

impl From<tera::Error> for ApiError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful detail in the source chain
        let mut detail = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }
        tracing::error!("Template error: {}", detail);
        ApiError::internal_server_error("Failed to render page")
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            let messages = list
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            field_errors.insert(field.to_string(), messages);
        }
        ApiError::unprocessable_entity("Validation failed", field_errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_hide_internal_detail() {
        let err: ApiError = StoreError::QueryError("relation \"secret_table\" does not exist".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("secret_table"));

        let err: ApiError = StoreError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), 503);

        let err: ApiError = StoreError::NotFound("Record '9' not found".into()).into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn unknown_status_is_a_bad_request() {
        let err: ApiError = FilterError::UnknownStatus { table: "todos".into(), status: "zzz".into() }.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["code"], "BAD_REQUEST");
        assert_eq!(err.to_json()["success"], false);
    }

    #[test]
    fn validation_errors_carry_field_messages() {
        let mut fields = FieldErrors::new();
        fields.insert("title".into(), vec!["Title is required".into()]);
        let body = ApiError::unprocessable_entity("Validation failed", fields).to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["title"][0], "Title is required");
    }
}
