#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use backoffice_api::config::AppConfig;
use backoffice_api::database::MemoryStore;
use backoffice_api::registry::TableRegistry;
use backoffice_api::types::Row;
use backoffice_api::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over a seeded in-memory store, driven in-process.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).with_context(|| format!("response is not JSON: {}", self.body))
    }

    pub fn is_html(&self) -> bool {
        self.content_type.starts_with("text/html")
    }
}

impl TestApp {
    pub fn from_yaml(fixtures: &str) -> Result<Self> {
        Self::from_store(MemoryStore::from_yaml(fixtures)?)
    }

    pub fn from_tables(tables: HashMap<String, Vec<Row>>) -> Result<Self> {
        Self::from_store(MemoryStore::with_tables(tables))
    }

    fn from_store(store: MemoryStore) -> Result<Self> {
        let store = Arc::new(store);
        let state = AppState::new(AppConfig::default(), TableRegistry::builtin()?, store.clone())?;
        Ok(Self { router: router(state), store })
    }

    pub async fn request(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(TestResponse { status, content_type, body: String::from_utf8(bytes.to_vec())? })
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.request(Request::get(uri).body(Body::empty())?).await
    }

    /// Same as a browser swap triggered by HTMX.
    pub async fn get_fragment(&self, uri: &str) -> Result<TestResponse> {
        self.request(Request::get(uri).header("HX-Request", "true").body(Body::empty())?).await
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> Result<TestResponse> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.request(request).await
    }

    pub async fn send_form(&self, method: Method, uri: &str, form: &str, htmx: bool) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if htmx {
            builder = builder.header("HX-Request", "true");
        }
        self.request(builder.body(Body::from(form.to_string()))?).await
    }

    pub async fn delete(&self, uri: &str) -> Result<TestResponse> {
        self.request(Request::delete(uri).body(Body::empty())?).await
    }
}

/// 25 todos: 12 pending, of which 3 mention milk; 2 more milk todos are
/// completed.
pub fn seeded_todos() -> HashMap<String, Vec<Row>> {
    let mut rows = Vec::new();
    for i in 1..=25 {
        let (status, title, description) = match i {
            1 => ("pending", "Buy milk".to_string(), "Semi-skimmed".to_string()),
            2 => ("pending", "Groceries".to_string(), "Eggs, MILK and bread".to_string()),
            3 => ("pending", "Oat milk for the office".to_string(), String::new()),
            4..=12 => ("pending", format!("Pending task {}", i), "Nothing special".to_string()),
            13 | 14 => ("completed", format!("Milk run {}", i), "Done already".to_string()),
            15..=19 => ("in_progress", format!("Ongoing task {}", i), "Halfway".to_string()),
            _ => ("completed", format!("Finished task {}", i), "Closed".to_string()),
        };
        let row = json!({
            "id": i,
            "title": title,
            "description": description,
            "status": status,
            "priority": "medium",
            "created_at": format!("2024-05-{:02}T09:00:00Z", i),
        });
        if let Value::Object(row) = row {
            rows.push(row);
        }
    }
    HashMap::from([("todos".to_string(), rows)])
}

pub const PEOPLE_AND_IDEAS: &str = r#"
users:
  - { id: 1, username: ada, email: ada@example.com, role: admin, is_active: false, is_verified: true, created_at: "2024-01-01T00:00:00Z" }
  - { id: 2, username: grace, email: grace@example.com, role: editor, is_active: false, is_verified: false, created_at: "2024-01-02T00:00:00Z" }
  - { id: 3, username: linus, email: linus@example.com, role: member, is_active: true, is_verified: true, created_at: "2024-01-03T00:00:00Z" }
ideas:
  - { id: 1, title: Coffee cart, slug: coffee-cart, description: "A pre-launch plan for a coffee cart", status: draft, upvotes: 4, downvotes: 1, created_at: "2024-02-01T00:00:00Z" }
  - { id: 2, title: Bike share, slug: bike-share, description: Rentals by the hour, status: published, upvotes: 0, downvotes: 0, created_at: "2024-02-02T00:00:00Z" }
portfolios:
  - { id: 7, title: Green ventures, upvotes: 2, downvotes: 0, created_at: "2024-03-01T00:00:00Z" }
"#;
