// handlers/mod.rs - HTTP handlers
//
// system: service info and health (public JSON)
// admin:  metadata-driven table pages, HTML with HTMX fragments
// api:    JSON endpoints for tables, resources and bulk actions

pub mod admin;
pub mod api;
pub mod system;

use axum::response::{Html, IntoResponse, Response};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::HxRequest;
use crate::services::TablePage;

/// Error as an inline HTML alert for HTMX callers, JSON otherwise.
pub fn error_response(state: &AppState, hx: HxRequest, error: ApiError) -> Response {
    log_error(&error);
    if hx.0 {
        (error.status(), Html(state.renderer.error_fragment(&error))).into_response()
    } else {
        error.into_response()
    }
}

/// Error as a full admin page, or a fragment for HTMX callers.
pub fn page_error(state: &AppState, hx: HxRequest, current_table: &str, error: ApiError) -> Response {
    log_error(&error);
    if hx.0 {
        (error.status(), Html(state.renderer.error_fragment(&error))).into_response()
    } else {
        let html = state.renderer.error_page(&state.registry, current_table, &error);
        (error.status(), Html(html)).into_response()
    }
}

fn log_error(error: &ApiError) {
    if error.status_code() >= 500 {
        tracing::error!(code = error.error_code(), "request failed: {}", error);
    } else {
        tracing::debug!(code = error.error_code(), "request rejected: {}", error);
    }
}

/// A loaded table as a fragment (HTMX) or a full admin page.
pub fn render_table(state: &AppState, hx: HxRequest, page: &TablePage, base_url: &str) -> Response {
    let rendered = if hx.0 {
        state.renderer.table_fragment(page, base_url)
    } else {
        state.renderer.table_page(&state.registry, page, base_url, None)
    };
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(error) => page_error(state, hx, &page.descriptor.table_name, error),
    }
}
