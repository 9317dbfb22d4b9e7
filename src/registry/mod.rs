//! Table registry: per-entity metadata describing columns, actions, filters
//! and row mappers for every browsable table.

pub mod mapper;
pub mod types;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::filter::is_valid_identifier;

pub use mapper::{apply_mappers, DataMapper};
pub use types::*;

const BUILTIN_TABLES: &str = include_str!("tables.yaml");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read table definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid table definitions: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Table '{0}' is defined more than once")]
    DuplicateTable(String),

    #[error("Table '{table}': invalid identifier '{name}'")]
    InvalidIdentifier { table: String, name: String },

    #[error("Table '{0}' declares plain status options but no status_field")]
    MissingStatusField(String),
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    tables: Vec<TableDescriptor>,
}

/// Registered tables, in declaration order.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    tables: Vec<Arc<TableDescriptor>>,
    index: HashMap<String, usize>,
}

impl TableRegistry {
    /// Tables shipped with the binary.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_yaml(BUILTIN_TABLES)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(raw)?;
        Self::from_descriptors(file.tables)
    }

    pub fn from_descriptors(descriptors: Vec<TableDescriptor>) -> Result<Self, RegistryError> {
        let mut tables = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            validate(&descriptor)?;
            if index.contains_key(&descriptor.table_name) {
                return Err(RegistryError::DuplicateTable(descriptor.table_name));
            }
            index.insert(descriptor.table_name.clone(), tables.len());
            tables.push(Arc::new(descriptor));
        }

        tracing::debug!("Loaded {} table descriptors", tables.len());
        Ok(Self { tables, index })
    }

    pub fn get(&self, table_name: &str) -> Option<Arc<TableDescriptor>> {
        self.index.get(table_name).map(|&i| Arc::clone(&self.tables[i]))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableDescriptor>> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn validate(descriptor: &TableDescriptor) -> Result<(), RegistryError> {
    let table = &descriptor.table_name;
    let invalid = |name: &str| RegistryError::InvalidIdentifier { table: table.clone(), name: name.to_string() };

    if !is_valid_identifier(table) {
        return Err(invalid(table));
    }
    for column in &descriptor.columns {
        if !is_valid_identifier(&column.key) {
            return Err(invalid(&column.key));
        }
        if let Some(key) = &column.description_key {
            if !is_valid_identifier(key) {
                return Err(invalid(key));
            }
        }
    }
    for field in &descriptor.fields {
        if !is_valid_identifier(&field.key) {
            return Err(invalid(&field.key));
        }
    }

    if let Some(filters) = &descriptor.filters {
        for field in filters.searchable_fields.iter().chain(filters.status_field.iter()) {
            if !is_valid_identifier(field) {
                return Err(invalid(field));
            }
        }
        let needs_status_field = filters
            .status_options
            .iter()
            .any(|o| o.filter.is_none() && o.value != crate::filter::translate::ALL_STATUS);
        if needs_status_field && filters.status_field.is_none() {
            return Err(RegistryError::MissingStatusField(table.clone()));
        }
    }
    Ok(())
}

/// View / edit / delete, offered on every table unless it opts out.
pub fn standard_actions() -> Vec<Action> {
    vec![
        Action {
            label: "View".to_string(),
            icon: Some("eye".to_string()),
            method: ActionMethod::Get,
            url: "/admin/table-pages/{table}/rows/{id}".to_string(),
            confirm: None,
        },
        Action {
            label: "Edit".to_string(),
            icon: Some("pencil".to_string()),
            method: ActionMethod::Get,
            url: "/admin/table-pages/{table}/rows/{id}/edit".to_string(),
            confirm: None,
        },
        Action {
            label: "Delete".to_string(),
            icon: Some("trash".to_string()),
            method: ActionMethod::Delete,
            url: "/admin/table-pages/{table}/rows/{id}".to_string(),
            confirm: Some("Delete this record?".to_string()),
        },
    ]
}

impl TableDescriptor {
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.table_name
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    /// Standard actions followed by table-specific ones, first label wins.
    pub fn merged_actions(&self) -> Vec<Action> {
        let base = if self.standard_actions { standard_actions() } else { Vec::new() };
        let mut merged: Vec<Action> = Vec::with_capacity(base.len() + self.actions.len());
        for action in base.into_iter().chain(self.actions.iter().cloned()) {
            if !merged.iter().any(|a| a.label == action.label) {
                merged.push(action);
            }
        }
        merged
    }

    pub fn is_editable(&self) -> bool {
        self.resource.is_some() && !self.fields.is_empty()
    }

    pub fn status_options(&self) -> &[StatusOption] {
        self.filters.as_ref().map(|f| f.status_options.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_loads() {
        let registry = TableRegistry::builtin().expect("builtin tables parse");
        for name in ["todos", "users", "ideas", "portfolios", "votes_management", "billings", "learning_content"] {
            assert!(registry.get(name).is_some(), "missing table {}", name);
        }
        assert!(registry.get("nope").is_none());

        let users = registry.get("users").unwrap();
        assert!(users.show_bulk_actions);
        assert!(users.filters.as_ref().unwrap().has_custom_filters());
        assert_eq!(users.resource.as_deref(), Some("/api/users"));
    }

    #[test]
    fn merges_actions_by_label() {
        let yaml = r#"
tables:
  - table_name: ideas
    entity_name: idea
    columns:
      - { key: title, label: Title, type: title }
    actions:
      - { label: View, url: "/elsewhere/{id}" }
      - { label: Feature, method: post, url: "/api/ideas/{id}/feature" }
"#;
        let registry = TableRegistry::from_yaml(yaml).unwrap();
        let labels: Vec<String> = registry.get("ideas").unwrap().merged_actions().into_iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["View", "Edit", "Delete", "Feature"]);

        let view = &registry.get("ideas").unwrap().merged_actions()[0];
        assert_eq!(view.resolve_url("ideas", "42"), "/admin/table-pages/ideas/rows/42");
    }

    #[test]
    fn rejects_bad_definitions() {
        let duplicate = r#"
tables:
  - { table_name: todos, entity_name: todo, columns: [] }
  - { table_name: todos, entity_name: todo, columns: [] }
"#;
        assert!(matches!(TableRegistry::from_yaml(duplicate), Err(RegistryError::DuplicateTable(_))));

        let bad_filter = r#"
tables:
  - table_name: users
    entity_name: user
    columns: []
    filters:
      status_options:
        - { value: verified, label: Verified, filter: "is_verified.like.true" }
"#;
        assert!(matches!(TableRegistry::from_yaml(bad_filter), Err(RegistryError::Yaml(_))));

        let bad_column = r#"
tables:
  - table_name: users
    entity_name: user
    columns:
      - { key: "name; drop", label: Name }
"#;
        assert!(matches!(TableRegistry::from_yaml(bad_column), Err(RegistryError::InvalidIdentifier { .. })));

        let missing_field = r#"
tables:
  - table_name: todos
    entity_name: todo
    columns: []
    filters:
      status_options:
        - { value: pending, label: Pending }
"#;
        assert!(matches!(TableRegistry::from_yaml(missing_field), Err(RegistryError::MissingStatusField(_))));
    }

    #[test]
    fn display_title_falls_back_to_table_name() {
        let registry = TableRegistry::builtin().unwrap();
        assert_eq!(registry.get("business_models").unwrap().display_title(), "Business Models");
    }
}
