// handlers/admin/bulk.rs - POST /admin/table-pages/:table_name/bulk

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::api::bulk::run_bulk;
use crate::middleware::{HxRequest, InputBody};

/// Bulk bar submit: the action must be one the table declares.
pub async fn table_bulk(
    State(state): State<AppState>,
    hx: HxRequest,
    Path(table_name): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    body: Result<InputBody, ApiError>,
) -> Response {
    run_bulk(&state, hx, &table_name, query, body).await
}
