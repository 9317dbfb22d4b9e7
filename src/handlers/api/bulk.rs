// handlers/api/bulk.rs - POST /api/bulk/users
//
// `action` and `ids` may come from the body (JSON or form) or from the
// query string, as used by the per-row activate/deactivate buttons.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::error_response;
use crate::middleware::body::merge_missing;
use crate::middleware::{ApiResponse, HxRequest, InputBody};
use crate::services::{BulkOutcome, BulkRequest};

pub async fn bulk_users(
    State(state): State<AppState>,
    hx: HxRequest,
    Query(query): Query<Vec<(String, String)>>,
    body: Result<InputBody, ApiError>,
) -> Response {
    run_bulk(&state, hx, "users", query, body).await
}

pub(crate) async fn run_bulk(
    state: &AppState,
    hx: HxRequest,
    table_name: &str,
    query: Vec<(String, String)>,
    body: Result<InputBody, ApiError>,
) -> Response {
    match execute(state, table_name, query, body).await {
        Ok(outcome) if hx.0 => match state.renderer.bulk_result(&outcome) {
            Ok(html) => Html(html).into_response(),
            Err(error) => error_response(state, hx, error),
        },
        Ok(outcome) => ApiResponse::success(outcome).into_response(),
        Err(error) => error_response(state, hx, error),
    }
}

async fn execute(
    state: &AppState,
    table_name: &str,
    query: Vec<(String, String)>,
    body: Result<InputBody, ApiError>,
) -> Result<BulkOutcome, ApiError> {
    let descriptor = state.descriptor(table_name)?;
    // a bodiless POST carries everything in the query string
    let body = match body {
        Ok(InputBody(value)) => value,
        Err(ApiError::InvalidJson(_)) if !query.is_empty() => serde_json::Value::Null,
        Err(error) => return Err(error),
    };
    let request = BulkRequest::from_value(&merge_missing(body, query))?;
    state.bulk.run(&descriptor, request).await
}
