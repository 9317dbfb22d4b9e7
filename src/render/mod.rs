//! HTML rendering for the admin UI: full pages and HTMX fragments.

mod filters;
pub mod view;

use tera::{Context, Tera};

use crate::error::ApiError;
use crate::registry::{TableDescriptor, TableRegistry};
use crate::services::{BulkOutcome, TablePage};
use crate::types::Row;

pub use filters::register_filters;
use view::{detail_fields, form_inputs, nav, sorted_field_errors, TableView};

const TEMPLATES: [(&str, &str); 12] = [
    ("base.html", include_str!("templates/base.html")),
    ("macros.html", include_str!("templates/macros.html")),
    ("table.html", include_str!("templates/table.html")),
    ("table_page.html", include_str!("templates/table_page.html")),
    ("index.html", include_str!("templates/index.html")),
    ("detail.html", include_str!("templates/detail.html")),
    ("form_fields.html", include_str!("templates/form_fields.html")),
    ("form.html", include_str!("templates/form.html")),
    ("error_fragment.html", include_str!("templates/error_fragment.html")),
    ("error_page.html", include_str!("templates/error_page.html")),
    ("success.html", include_str!("templates/success.html")),
    ("bulk_result.html", include_str!("templates/bulk_result.html")),
];

/// Compiled templates. Built once at startup and shared.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        register_filters(&mut tera);
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, ApiError> {
        Ok(self.tera.render(name, context)?)
    }

    fn layout(&self, registry: &TableRegistry, current_table: &str) -> Context {
        let mut context = Context::new();
        context.insert("nav", &nav(registry));
        context.insert("current_table", current_table);
        context
    }

    /// Table body, pagination and bulk bar only; the target of HTMX swaps.
    pub fn table_fragment(&self, page: &TablePage, base_url: &str) -> Result<String, ApiError> {
        let context = Context::from_serialize(TableView::build(page, base_url))?;
        self.render("table.html", &context)
    }

    /// Full page with layout, search, filter chips and the table.
    pub fn table_page(
        &self,
        registry: &TableRegistry,
        page: &TablePage,
        base_url: &str,
        error: Option<String>,
    ) -> Result<String, ApiError> {
        let mut view = TableView::build(page, base_url);
        view.error = error;

        let table_html = self.render("table.html", &Context::from_serialize(&view)?)?;
        let mut context = self.layout(registry, &view.table_name);
        context.extend(Context::from_serialize(&view)?);
        context.insert("table_html", &table_html);
        self.render("table_page.html", &context)
    }

    pub fn index(&self, registry: &TableRegistry) -> Result<String, ApiError> {
        self.render("index.html", &self.layout(registry, ""))
    }

    pub fn detail(&self, registry: &TableRegistry, descriptor: &TableDescriptor, id: &str, row: &Row) -> Result<String, ApiError> {
        let mut context = self.layout(registry, &descriptor.table_name);
        context.insert("table_name", &descriptor.table_name);
        context.insert("entity_name", &descriptor.entity_name);
        context.insert("title", &descriptor.display_title());
        context.insert("id", id);
        context.insert("editable", &descriptor.is_editable());
        context.insert("fields", &detail_fields(descriptor, row));
        self.render("detail.html", &context)
    }

    /// Create form when `existing` is `None`, edit form otherwise.
    pub fn form(
        &self,
        registry: &TableRegistry,
        descriptor: &TableDescriptor,
        existing: Option<(&str, &Row)>,
        fragment: bool,
    ) -> Result<String, ApiError> {
        let resource = match descriptor.resource.as_deref() {
            Some(resource) if descriptor.is_editable() => resource,
            _ => {
                return Err(ApiError::not_found(format!(
                    "Table '{}' has no editable form",
                    descriptor.table_name
                )))
            }
        };
        let action = match existing {
            Some((id, _)) => format!("{}/{}", resource, id),
            None => resource.to_string(),
        };

        let mut context = self.layout(registry, &descriptor.table_name);
        context.insert("table_name", &descriptor.table_name);
        context.insert("entity_name", &descriptor.entity_name);
        context.insert("title", &descriptor.display_title());
        context.insert("id", &existing.map(|(id, _)| id));
        context.insert("action", &action);
        context.insert("inputs", &form_inputs(descriptor, existing.map(|(_, row)| row)));

        self.render(if fragment { "form_fields.html" } else { "form.html" }, &context)
    }

    pub fn success(&self, message: &str, link: Option<&str>) -> Result<String, ApiError> {
        let mut context = Context::new();
        context.insert("message", message);
        context.insert("link", &link);
        self.render("success.html", &context)
    }

    pub fn bulk_result(&self, outcome: &BulkOutcome) -> Result<String, ApiError> {
        self.render("bulk_result.html", &Context::from_serialize(outcome)?)
    }

    /// Never fails: falls back to a bare alert if the template cannot render.
    pub fn error_fragment(&self, error: &ApiError) -> String {
        self.render("error_fragment.html", &error_context(error))
            .unwrap_or_else(|_| fallback_alert(error))
    }

    pub fn error_page(&self, registry: &TableRegistry, current_table: &str, error: &ApiError) -> String {
        let mut context = self.layout(registry, current_table);
        context.extend(error_context(error));
        context.insert("reason", error.status().canonical_reason().unwrap_or("Error"));
        self.render("error_page.html", &context)
            .unwrap_or_else(|_| fallback_alert(error))
    }
}

fn error_context(error: &ApiError) -> Context {
    let mut context = Context::new();
    context.insert("status", &error.status_code());
    context.insert("message", error.message());
    context.insert("field_errors", &sorted_field_errors(error));
    context
}

fn fallback_alert(error: &ApiError) -> String {
    format!(
        "<div class=\"alert alert-error\" role=\"alert\" data-status=\"{}\"><strong>{}</strong></div>",
        error.status_code(),
        tera::escape_html(error.message())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::database::MemoryStore;
    use crate::error::FieldErrors;
    use crate::services::{TableParams, TableRequest, TableService};
    use serde_json::json;
    use std::sync::Arc;

    const FIXTURE: &str = r#"
todos:
  - { id: 1, title: "Buy <milk>", description: "Semi-skimmed", status: pending, priority: high, created_at: "2024-03-05T10:00:00Z" }
  - { id: 2, title: Write report, status: completed, priority: low, created_at: "2024-03-06T10:00:00Z" }
"#;

    async fn todos_page() -> (TableRegistry, TablePage) {
        let registry = TableRegistry::builtin().unwrap();
        let service = TableService::new(Arc::new(MemoryStore::from_yaml(FIXTURE).unwrap()));
        let request = TableRequest::from_params(TableParams::default(), &PaginationConfig { default_limit: 10, max_limit: 100 });
        let page = service.load(registry.get("todos").unwrap(), request).await.unwrap();
        (registry, page)
    }

    #[test]
    fn templates_compile() {
        Renderer::new().expect("templates compile");
    }

    #[tokio::test]
    async fn fragment_has_no_layout() {
        let renderer = Renderer::new().unwrap();
        let (_, page) = todos_page().await;

        let html = renderer.table_fragment(&page, "/admin/table-pages/todos").unwrap();
        assert!(!html.contains("<html"));
        assert!(html.contains("Buy &lt;milk&gt;"));
        assert!(html.contains("Semi-skimmed"));
        assert!(html.contains("badge-warning"));
        assert!(html.contains(&tera::escape_html("/admin/table-pages/todos/rows/1/edit")));
        assert!(html.contains("Showing 1-2 of 2"));
    }

    #[tokio::test]
    async fn full_page_has_layout_and_chips() {
        let renderer = Renderer::new().unwrap();
        let (registry, page) = todos_page().await;

        let html = renderer
            .table_page(&registry, &page, "/admin/table-pages/todos", None)
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("id=\"table-container\""));
        assert!(html.contains("<table class=\"data-table\">"));
        assert!(html.contains("Pending <span class=\"count\">1</span>"));
        assert!(html.contains("href=\"/admin/table-pages/users\""));
    }

    #[test]
    fn error_fragment_lists_field_errors() {
        let renderer = Renderer::new().unwrap();
        let mut fields = FieldErrors::new();
        fields.insert("title".into(), vec!["Title is required".into()]);
        let html = renderer.error_fragment(&ApiError::unprocessable_entity("Validation failed", fields));

        assert!(html.contains("data-status=\"422\""));
        assert!(html.contains("<code>title</code>: Title is required"));
    }

    #[test]
    fn forms_post_to_resource_and_put_to_record() {
        let renderer = Renderer::new().unwrap();
        let registry = TableRegistry::builtin().unwrap();
        let users = registry.get("users").unwrap();

        let create = renderer.form(&registry, &users, None, true).unwrap();
        assert!(create.contains(&format!("hx-post=\"{}\"", tera::escape_html("/api/users"))));

        let row = json!({ "id": 3, "username": "ada", "is_active": true });
        let edit = renderer.form(&registry, &users, Some(("3", row.as_object().unwrap())), false).unwrap();
        assert!(edit.contains(&format!("hx-put=\"{}\"", tera::escape_html("/api/users/3"))));
        assert!(edit.contains("value=\"ada\""));
        assert!(edit.contains("checked"));

        let votes = registry.get("votes_management").unwrap();
        assert_eq!(renderer.form(&registry, &votes, None, false).unwrap_err().status_code(), 404);
    }
}
