// handlers/admin/rows.rs - GET|DELETE /admin/table-pages/:table_name/rows/:id

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{error_response, page_error};
use crate::middleware::{ok_response, HxRequest};
use crate::services::votes::VOTES_TABLE;

pub async fn row_detail(
    State(state): State<AppState>,
    hx: HxRequest,
    Path((table_name, id)): Path<(String, String)>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(&table_name)?;
        if descriptor.table_name == VOTES_TABLE {
            return Err(ApiError::record_not_found(&table_name, &id));
        }
        let row = state.crud.get(&descriptor.table_name, &id).await?;
        state.renderer.detail(&state.registry, &descriptor, &id, &row)
    }
    .await;

    match result {
        Ok(html) => Html(html).into_response(),
        Err(error) => page_error(&state, hx, &table_name, error),
    }
}

/// Empty 200 for HTMX (the row is swapped out), `{success: true}` otherwise.
pub async fn row_delete(
    State(state): State<AppState>,
    hx: HxRequest,
    Path((table_name, id)): Path<(String, String)>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(&table_name)?;
        if descriptor.table_name == VOTES_TABLE {
            return Err(ApiError::record_not_found(&table_name, &id));
        }
        state.crud.delete(&descriptor.table_name, &id).await
    }
    .await;

    match result {
        Ok(()) if hx.0 => Html(String::new()).into_response(),
        Ok(()) => ok_response(),
        Err(error) => error_response(&state, hx, error),
    }
}
