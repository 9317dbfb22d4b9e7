use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::TableStore;
use crate::error::ApiError;
use crate::handlers::{admin, api, system};
use crate::registry::{TableDescriptor, TableRegistry};
use crate::render::Renderer;
use crate::services::{BulkService, CrudService, TableParams, TableRequest, TableService};
use crate::validation::{IdeaInput, Resource, TodoInput, UserInput};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<TableRegistry>,
    pub store: Arc<dyn TableStore>,
    pub renderer: Arc<Renderer>,
    pub tables: TableService,
    pub crud: CrudService,
    pub bulk: BulkService,
}

impl AppState {
    pub fn new(config: AppConfig, registry: TableRegistry, store: Arc<dyn TableStore>) -> Result<Self, tera::Error> {
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            renderer: Arc::new(Renderer::new()?),
            tables: TableService::new(store.clone()),
            crud: CrudService::new(store.clone()),
            bulk: BulkService::new(store.clone()),
            store,
        })
    }

    pub fn descriptor(&self, table_name: &str) -> Result<Arc<TableDescriptor>, ApiError> {
        self.registry
            .get(table_name)
            .ok_or_else(|| ApiError::table_not_found(table_name))
    }

    pub fn table_request(&self, params: TableParams) -> TableRequest {
        TableRequest::from_params(params, &self.config.pagination)
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    let app = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(admin_routes())
        .merge(table_api_routes())
        .merge(resource_routes::<TodoInput>())
        .merge(resource_routes::<UserInput>())
        .merge(resource_routes::<IdeaInput>())
        .route("/api/bulk/users", post(api::bulk_users))
        .fallback(system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        );

    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };
    app.with_state(state)
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/table-pages", get(admin::table_index))
        .route("/admin/table-pages/:table_name", get(admin::table_page))
        .route("/admin/table-pages/:table_name/new", get(admin::new_form))
        .route("/admin/table-pages/:table_name/bulk", post(admin::table_bulk))
        .route(
            "/admin/table-pages/:table_name/rows/:id",
            get(admin::row_detail).delete(admin::row_delete),
        )
        .route("/admin/table-pages/:table_name/rows/:id/edit", get(admin::edit_form))
}

fn table_api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tables", get(api::tables_list))
        .route("/api/tables/:table_name/counts", get(api::table_counts))
}

/// List/create on the collection, get/update/delete on a record.
fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/api/{}", R::TABLE);
    let record = format!("/api/{}/:id", R::TABLE);

    Router::new()
        .route(&collection, get(api::resource_list::<R>).post(api::resource_create::<R>))
        .route(
            &record,
            get(api::resource_get::<R>)
                .put(api::resource_update::<R>)
                .patch(api::resource_update::<R>)
                .delete(api::resource_delete::<R>),
        )
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
