// handlers/admin/table_page.rs - GET /admin/table-pages[/:table_name] handlers

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::app::AppState;
use crate::handlers::{error_response, page_error, render_table};
use crate::middleware::HxRequest;
use crate::services::{TablePage, TableParams};

pub async fn table_index(State(state): State<AppState>, hx: HxRequest) -> Response {
    match state.renderer.index(&state.registry) {
        Ok(html) => Html(html).into_response(),
        Err(error) => page_error(&state, hx, "", error),
    }
}

/// GET /admin/table-pages/:table_name?search&status&page&limit
pub async fn table_page(
    State(state): State<AppState>,
    hx: HxRequest,
    Path(table_name): Path<String>,
    Query(params): Query<TableParams>,
) -> Response {
    let descriptor = match state.descriptor(&table_name) {
        Ok(descriptor) => descriptor,
        Err(error) => return page_error(&state, hx, &table_name, error),
    };
    let request = state.table_request(params);
    let base_url = format!("/admin/table-pages/{}", descriptor.table_name);

    match state.tables.load(descriptor.clone(), request.clone()).await {
        Ok(page) => render_table(&state, hx, &page, &base_url),
        Err(error) if hx.0 => error_response(&state, hx, error),
        Err(error) => {
            // Full page still renders: empty table plus the safe message.
            warn!(table = %table_name, code = error.error_code(), "table page failed: {}", error);
            let page = TablePage::empty(descriptor, request);
            match state
                .renderer
                .table_page(&state.registry, &page, &base_url, Some(error.message().to_string()))
            {
                Ok(html) => (error.status(), Html(html)).into_response(),
                Err(render_error) => page_error(&state, hx, &table_name, render_error),
            }
        }
    }
}
