// handlers/system.rs - GET /, GET /health and the 404 fallback

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let tables: Vec<&str> = state.registry.tables().map(|t| t.table_name.as_str()).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Backoffice API",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "endpoints": {
                "admin": "/admin/table-pages[/:table_name]",
                "tables": "/api/tables[/:table_name/counts]",
                "todos": "/api/todos[/:id]",
                "users": "/api/users[/:id]",
                "ideas": "/api/ideas[/:id]",
                "bulk": "/api/bulk/users",
                "health": "/health"
            },
            "tables": tables
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
