use serde::{Deserialize, Serialize};

use super::mapper::DataMapper;
use crate::filter::translate::StatusFilter;

/// Static description of one browsable table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub table_name: String,
    pub entity_name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub columns: Vec<Column>,
    /// Table-specific actions, merged after the standard ones.
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub bulk_actions: Vec<BulkAction>,
    #[serde(default = "default_true")]
    pub show_checkbox: bool,
    #[serde(default)]
    pub show_bulk_actions: bool,
    /// When false the view/edit/delete row actions are not offered.
    #[serde(default = "default_true")]
    pub standard_actions: bool,
    #[serde(default)]
    pub default_order: Option<String>,
    #[serde(default)]
    pub filters: Option<FilterDescriptor>,
    #[serde(default)]
    pub mappers: Vec<DataMapper>,
    /// JSON API base path for tables with validated create/update endpoints.
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Status,
    Date,
    Title,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub responsive: bool,
    #[serde(default)]
    pub description_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMethod {
    #[default]
    Get,
    Post,
    Delete,
}

/// A per-row action. `url` may contain `{table}` and `{id}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub method: ActionMethod,
    pub url: String,
    #[serde(default)]
    pub confirm: Option<String>,
}

impl Action {
    pub fn resolve_url(&self, table: &str, id: &str) -> String {
        self.url.replace("{table}", table).replace("{id}", id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAction {
    pub label: String,
    pub action: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub confirm: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterDescriptor {
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    #[serde(default)]
    pub status_field: Option<String>,
    #[serde(default)]
    pub status_options: Vec<StatusOption>,
}

impl FilterDescriptor {
    pub fn has_custom_filters(&self) -> bool {
        self.status_options.iter().any(|o| o.filter.is_some())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub filter: Option<StatusFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Textarea,
    Select,
    Checkbox,
    Date,
    Email,
    Url,
}

/// One input of a create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub input: InputKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}
