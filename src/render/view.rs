//! Template view models built from table pages and registry metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::translate::ALL_STATUS;
use crate::registry::{Action, ActionMethod, BulkAction, ColumnType, TableDescriptor, TableRegistry};
use crate::services::{PaginationState, TablePage};
use crate::types::{id_string, Row};

pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

#[derive(Debug, Serialize)]
pub struct NavItem {
    pub table_name: String,
    pub title: String,
}

pub fn nav(registry: &TableRegistry) -> Vec<NavItem> {
    registry
        .tables()
        .map(|t| NavItem { table_name: t.table_name.clone(), title: t.display_title() })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub label: String,
    pub responsive: bool,
}

#[derive(Debug, Serialize)]
pub struct CellView {
    pub kind: ColumnType,
    pub text: String,
    pub raw: String,
    pub description: Option<String>,
    pub responsive: bool,
}

#[derive(Debug, Serialize)]
pub struct ActionView {
    pub label: String,
    pub icon: Option<String>,
    pub method: ActionMethod,
    pub url: String,
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<CellView>,
    pub actions: Vec<ActionView>,
}

#[derive(Debug, Serialize)]
pub struct StatusChip {
    pub value: String,
    pub label: String,
    pub icon: Option<String>,
    pub count: i64,
    pub active: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PageLink {
    pub label: String,
    pub url: Option<String>,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct TableView {
    pub table_name: String,
    pub entity_name: String,
    pub title: String,
    pub base_url: String,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    pub has_actions: bool,
    pub show_checkbox: bool,
    pub show_bulk_actions: bool,
    pub bulk_actions: Vec<BulkAction>,
    pub bulk_url: String,
    pub colspan: usize,
    pub pagination: PaginationState,
    pub links: Vec<PageLink>,
    pub search: String,
    pub status: String,
    pub limit: u32,
    pub page_sizes: Vec<u32>,
    pub chips: Vec<StatusChip>,
    pub new_url: Option<String>,
    pub error: Option<String>,
}

impl TableView {
    pub fn build(page: &TablePage, base_url: &str) -> Self {
        let descriptor = &page.descriptor;
        let columns: Vec<ColumnView> = descriptor
            .visible_columns()
            .map(|c| ColumnView { label: c.label.clone(), responsive: c.responsive })
            .collect();
        let rows: Vec<RowView> = page
            .mapped_rows()
            .iter()
            .map(|row| row_view(descriptor, &page.actions, row))
            .collect();

        let has_actions = !page.actions.is_empty();
        let colspan = columns.len() + usize::from(descriptor.show_checkbox) + usize::from(has_actions);
        let search = page.request.search.clone().unwrap_or_default();
        let status = page.request.status.clone().unwrap_or_default();
        let limit = page.request.limit;

        let query = |page_number: u32, status: &str| list_url(base_url, &search, status, page_number, limit);

        let chips = descriptor
            .status_options()
            .iter()
            .map(|option| StatusChip {
                value: option.value.clone(),
                label: option.label.clone(),
                icon: option.icon.clone(),
                count: page.filter_counts.get(&option.value).copied().unwrap_or(0),
                active: option.value == status || (status.is_empty() && option.value == ALL_STATUS),
                url: query(1, &option.value),
            })
            .collect();

        let p = &page.pagination;
        let mut links = Vec::with_capacity(p.pages.len() + 2);
        links.push(PageLink { label: "Previous".into(), url: p.prev_page.map(|n| query(n, &status)), active: false });
        for &n in &p.pages {
            links.push(PageLink { label: n.to_string(), url: Some(query(n, &status)), active: n == p.current_page });
        }
        links.push(PageLink { label: "Next".into(), url: p.next_page.map(|n| query(n, &status)), active: false });

        let mut page_sizes = PAGE_SIZES.to_vec();
        if !page_sizes.contains(&limit) {
            page_sizes.push(limit);
            page_sizes.sort_unstable();
        }

        Self {
            table_name: descriptor.table_name.clone(),
            entity_name: descriptor.entity_name.clone(),
            title: descriptor.display_title(),
            base_url: base_url.to_string(),
            columns,
            rows,
            has_actions,
            show_checkbox: descriptor.show_checkbox,
            show_bulk_actions: descriptor.show_bulk_actions && !descriptor.bulk_actions.is_empty(),
            bulk_actions: descriptor.bulk_actions.clone(),
            bulk_url: format!("/admin/table-pages/{}/bulk", descriptor.table_name),
            colspan,
            pagination: p.clone(),
            links,
            search: search.clone(),
            status: status.clone(),
            limit,
            page_sizes,
            chips,
            new_url: descriptor
                .is_editable()
                .then(|| format!("/admin/table-pages/{}/new", descriptor.table_name)),
            error: None,
        }
    }
}

pub fn list_url(base_url: &str, search: &str, status: &str, page: u32, limit: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if !search.is_empty() {
        query.append_pair("search", search);
    }
    if !status.is_empty() && status != ALL_STATUS {
        query.append_pair("status", status);
    }
    query.append_pair("page", &page.to_string());
    query.append_pair("limit", &limit.to_string());
    format!("{}?{}", base_url, query.finish())
}

pub fn row_view(descriptor: &TableDescriptor, actions: &[Action], row: &Row) -> RowView {
    let id = row.get("id").and_then(id_string).unwrap_or_default();
    let cells = descriptor
        .visible_columns()
        .map(|column| {
            let value = row.get(&column.key).unwrap_or(&Value::Null);
            CellView {
                kind: column.kind,
                text: match column.kind {
                    ColumnType::Date => format_date(value),
                    _ => display_value(value),
                },
                raw: raw_text(value),
                description: column
                    .description_key
                    .as_ref()
                    .and_then(|key| row.get(key))
                    .map(display_value)
                    .filter(|text| !text.is_empty() && text != "-"),
                responsive: column.responsive,
            }
        })
        .collect();

    let actions = if id.is_empty() {
        Vec::new()
    } else {
        actions
            .iter()
            .map(|action| ActionView {
                label: action.label.clone(),
                icon: action.icon.clone(),
                method: action.method,
                url: action.resolve_url(&descriptor.table_name, &id),
                confirm: action.confirm.clone(),
            })
            .collect()
    };

    RowView { id, cells, actions }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text shown in a cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// `2024-03-05T10:00:00Z` and `2024-03-05` both display as `Mar 5, 2024`.
pub fn format_date(value: &Value) -> String {
    let Value::String(raw) = value else {
        return display_value(value);
    };
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.clone(),
    }
}

/// Field list of a single record for the detail view.
#[derive(Debug, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub text: String,
}

pub fn detail_fields(descriptor: &TableDescriptor, row: &Row) -> Vec<FieldView> {
    let mut fields: Vec<FieldView> = descriptor
        .columns
        .iter()
        .filter(|c| row.contains_key(&c.key))
        .map(|c| FieldView {
            key: c.key.clone(),
            label: c.label.clone(),
            text: match c.kind {
                ColumnType::Date => format_date(&row[&c.key]),
                _ => display_value(&row[&c.key]),
            },
        })
        .collect();

    for (key, value) in row {
        if !fields.iter().any(|f| &f.key == key) {
            fields.push(FieldView { key: key.clone(), label: humanize(key), text: display_value(value) });
        }
    }
    fields
}

/// Create/edit form input with its current value.
#[derive(Debug, Serialize)]
pub struct InputView {
    pub key: String,
    pub label: String,
    pub input: crate::registry::InputKind,
    pub options: Vec<String>,
    pub required: bool,
    pub value: String,
    pub checked: bool,
}

pub fn form_inputs(descriptor: &TableDescriptor, row: Option<&Row>) -> Vec<InputView> {
    descriptor
        .fields
        .iter()
        .map(|field| {
            let value = row.and_then(|r| r.get(&field.key)).unwrap_or(&Value::Null);
            InputView {
                key: field.key.clone(),
                label: field.label.clone(),
                input: field.input,
                options: field.options.clone(),
                required: field.required,
                value: raw_text(value),
                checked: matches!(value, Value::Bool(true)),
            }
        })
        .collect()
}

/// Field errors in a stable order for display.
pub fn sorted_field_errors(error: &ApiError) -> Option<BTreeMap<String, Vec<String>>> {
    error.field_errors().map(|fields| fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// `in_progress` becomes `In progress`.
pub fn humanize(raw: &str) -> String {
    let spaced = raw.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
