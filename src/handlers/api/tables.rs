// handlers/api/tables.rs - registry and status-count endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/tables
pub async fn tables_list(State(state): State<AppState>) -> ApiResponse<Vec<Value>> {
    let tables = state
        .registry
        .tables()
        .map(|t| {
            json!({
                "table_name": t.table_name,
                "entity_name": t.entity_name,
                "title": t.display_title(),
                "href": format!("/admin/table-pages/{}", t.table_name),
                "resource": t.resource,
                "editable": t.is_editable(),
                "status_options": t.status_options().iter().map(|o| &o.value).collect::<Vec<_>>(),
            })
        })
        .collect();
    ApiResponse::success(tables)
}

/// GET /api/tables/:table_name/counts
pub async fn table_counts(State(state): State<AppState>, Path(table_name): Path<String>) -> Response {
    let result: ApiResult<Value> = async {
        let descriptor = state.descriptor(&table_name)?;
        let counts = state.tables.counts(&descriptor).await?;
        Ok(ApiResponse::success(json!({ "table": descriptor.table_name, "filter_counts": counts })))
    }
    .await;

    match result {
        Ok(response) => response.into_response(),
        Err(error) => error.into_response(),
    }
}
