// handlers/admin/forms.rs - create and edit forms for tables with a resource

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::page_error;
use crate::middleware::HxRequest;

/// GET /admin/table-pages/:table_name/new
pub async fn new_form(State(state): State<AppState>, hx: HxRequest, Path(table_name): Path<String>) -> Response {
    let result = state
        .descriptor(&table_name)
        .and_then(|descriptor| state.renderer.form(&state.registry, &descriptor, None, hx.0));

    match result {
        Ok(html) => Html(html).into_response(),
        Err(error) => page_error(&state, hx, &table_name, error),
    }
}

/// GET /admin/table-pages/:table_name/rows/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    hx: HxRequest,
    Path((table_name, id)): Path<(String, String)>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(&table_name)?;
        if !descriptor.is_editable() {
            return Err(ApiError::not_found(format!("Table '{}' has no editable form", table_name)));
        }
        let row = state.crud.get(&descriptor.table_name, &id).await?;
        state.renderer.form(&state.registry, &descriptor, Some((&id, &row)), hx.0)
    }
    .await;

    match result {
        Ok(html) => Html(html).into_response(),
        Err(error) => page_error(&state, hx, &table_name, error),
    }
}
