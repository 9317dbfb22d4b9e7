// handlers/api/resources.rs - CRUD for the validated resources
//
// GET    /api/:resource          list (JSON or table fragment)
// POST   /api/:resource          create
// GET    /api/:resource/:id      show
// PUT    /api/:resource/:id      partial update (PATCH is the same)
// DELETE /api/:resource/:id      delete

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{error_response, render_table};
use crate::middleware::{ok_response, ApiResponse, HxRequest, InputBody};
use crate::registry::TableDescriptor;
use crate::render::view::humanize;
use crate::services::TableParams;
use crate::types::{id_string, Row};
use crate::validation::{self, Resource};

pub async fn resource_list<R: Resource>(
    State(state): State<AppState>,
    hx: HxRequest,
    Query(params): Query<TableParams>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(R::TABLE)?;
        state.tables.load(descriptor, state.table_request(params)).await
    }
    .await;

    match result {
        Ok(page) if hx.0 => {
            let base_url = page
                .descriptor
                .resource
                .clone()
                .unwrap_or_else(|| format!("/api/{}", R::TABLE));
            render_table(&state, hx, &page, &base_url)
        }
        Ok(page) => ApiResponse::success(page.data()).into_response(),
        Err(error) => error_response(&state, hx, error),
    }
}

pub async fn resource_create<R: Resource>(
    State(state): State<AppState>,
    hx: HxRequest,
    body: Result<InputBody, ApiError>,
) -> Response {
    let result = async {
        let InputBody(body) = body?;
        let descriptor = state.descriptor(R::TABLE)?;
        let values = validation::for_create::<R>(body)?;
        let row = state.crud.create(R::TABLE, values).await?;
        Ok::<_, ApiError>((descriptor, row))
    }
    .await;

    match result {
        Ok((descriptor, row)) if hx.0 => {
            success_fragment(&state, hx, StatusCode::CREATED, &descriptor, "created", Some(&row))
        }
        Ok((_, row)) => ApiResponse::created(row).into_response(),
        Err(error) => error_response(&state, hx, error),
    }
}

pub async fn resource_get<R: Resource>(
    State(state): State<AppState>,
    hx: HxRequest,
    Path(id): Path<String>,
) -> Response {
    match state.crud.get(R::TABLE, &id).await {
        Ok(row) => ApiResponse::success(row).into_response(),
        Err(error) => error_response(&state, hx, error),
    }
}

/// Only the fields present in the body change; last writer wins.
pub async fn resource_update<R: Resource>(
    State(state): State<AppState>,
    hx: HxRequest,
    Path(id): Path<String>,
    body: Result<InputBody, ApiError>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(R::TABLE)?;
        // a missing record is 404 whatever the body holds
        state.crud.get(R::TABLE, &id).await?;
        let InputBody(body) = body?;
        let values = validation::for_update::<R>(body)?;
        let row = state.crud.update(R::TABLE, &id, values).await?;
        Ok::<_, ApiError>((descriptor, row))
    }
    .await;

    match result {
        Ok((descriptor, row)) if hx.0 => {
            success_fragment(&state, hx, StatusCode::OK, &descriptor, "updated", Some(&row))
        }
        Ok((_, row)) => ApiResponse::success(row).into_response(),
        Err(error) => error_response(&state, hx, error),
    }
}

/// Missing records are 404 on every attempt.
pub async fn resource_delete<R: Resource>(
    State(state): State<AppState>,
    hx: HxRequest,
    Path(id): Path<String>,
) -> Response {
    let result = async {
        let descriptor = state.descriptor(R::TABLE)?;
        state.crud.delete(R::TABLE, &id).await?;
        Ok::<_, ApiError>(descriptor)
    }
    .await;

    match result {
        Ok(descriptor) if hx.0 => success_fragment(&state, hx, StatusCode::OK, &descriptor, "deleted", None),
        Ok(_) => ok_response(),
        Err(error) => error_response(&state, hx, error),
    }
}

fn success_fragment(
    state: &AppState,
    hx: HxRequest,
    status: StatusCode,
    descriptor: &Arc<TableDescriptor>,
    verb: &str,
    row: Option<&Row>,
) -> Response {
    let message = format!("{} {}", humanize(&descriptor.entity_name), verb);
    let link = row
        .and_then(|r| r.get("id"))
        .and_then(id_string)
        .map(|id| format!("/admin/table-pages/{}/rows/{}", descriptor.table_name, id));

    match state.renderer.success(&message, link.as_deref()) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(error) => error_response(state, hx, error),
    }
}
