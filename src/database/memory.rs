use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::store::{StoreError, TableStore};
use crate::filter::{is_valid_identifier, matcher, FilterData, FilterError};
use crate::types::{id_string, Row};

/// In-process store evaluating the filter language with the row matcher.
///
/// Ids are assigned from a per-table integer sequence; tables that do not
/// exist yet read as empty.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: HashMap<String, Vec<Row>>) -> Self {
        Self { tables: RwLock::new(tables) }
    }

    /// Fixture document: a map of table name to a list of rows.
    pub fn from_yaml(raw: &str) -> Result<Self, StoreError> {
        let tables: HashMap<String, Vec<Row>> =
            serde_yaml::from_str(raw).map_err(|e| StoreError::QueryError(format!("invalid fixtures: {}", e)))?;
        for name in tables.keys() {
            check_table(name)?;
        }
        info!("Loaded fixtures for {} tables", tables.len());
        Ok(Self::with_tables(tables))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::QueryError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    async fn snapshot(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        check_table(table)?;
        Ok(self.tables.read().await.get(table).cloned().unwrap_or_default())
    }
}

fn check_table(table: &str) -> Result<(), StoreError> {
    if is_valid_identifier(table) {
        Ok(())
    } else {
        Err(FilterError::InvalidTableName(table.to_string()).into())
    }
}

fn has_id(row: &Row, id: &str) -> bool {
    row.get("id").and_then(id_string).as_deref() == Some(id)
}

fn next_id(rows: &[Row]) -> i64 {
    rows.iter().filter_map(|r| r.get("id").and_then(Value::as_i64)).max().unwrap_or(0) + 1
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, filter: FilterData) -> Result<Vec<Row>, StoreError> {
        let rows = self.snapshot(table).await?;
        Ok(matcher::apply(rows, &filter)?)
    }

    async fn count(&self, table: &str, where_clause: Option<Value>) -> Result<i64, StoreError> {
        let rows = self.snapshot(table).await?;
        Ok(matcher::count_rows(&rows, where_clause.as_ref())?)
    }

    async fn find_by_id(&self, table: &str, id: &str) -> Result<Option<Row>, StoreError> {
        check_table(table)?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| rows.iter().find(|r| has_id(r, id)).cloned()))
    }

    async fn insert(&self, table: &str, mut values: Row) -> Result<Row, StoreError> {
        check_table(table)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        if values.get("id").map_or(true, Value::is_null) {
            values.insert("id".to_string(), Value::from(next_id(rows)));
        }
        values
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        rows.push(values.clone());
        Ok(values)
    }

    async fn update(&self, table: &str, id: &str, values: Row) -> Result<Option<Row>, StoreError> {
        check_table(table)?;
        let mut tables = self.tables.write().await;
        let row = match tables.get_mut(table).and_then(|rows| rows.iter_mut().find(|r| has_id(r, id))) {
            Some(row) => row,
            None => return Ok(None),
        };

        for (key, value) in values {
            if key != "id" {
                row.insert(key, value);
            }
        }
        row.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        check_table(table)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| !has_id(r, id));
        Ok(rows.len() < before)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURES: &str = r#"
todos:
  - { id: 1, title: Buy milk, status: pending }
  - { id: 2, title: Walk dog, status: completed }
"#;

    fn values(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn reads_fixtures_and_filters() {
        let store = MemoryStore::from_yaml(FIXTURES).unwrap();
        assert_eq!(store.count("todos", None).await.unwrap(), 2);
        assert_eq!(store.count("todos", Some(json!({ "status": "pending" }))).await.unwrap(), 1);
        assert_eq!(store.count("missing", None).await.unwrap(), 0);

        let found = store.find_by_id("todos", "2").await.unwrap().unwrap();
        assert_eq!(found["title"], json!("Walk dog"));
        assert!(store.find_by_id("todos", "9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_assigns_sequence_id_and_timestamp() {
        let store = MemoryStore::from_yaml(FIXTURES).unwrap();
        let row = store.insert("todos", values(json!({ "title": "New" }))).await.unwrap();
        assert_eq!(row["id"], json!(3));
        assert!(row["created_at"].is_string());

        let empty = MemoryStore::new();
        let row = empty.insert("ideas", values(json!({ "title": "First" }))).await.unwrap();
        assert_eq!(row["id"], json!(1));
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let store = MemoryStore::from_yaml(FIXTURES).unwrap();

        let updated = store.update("todos", "1", values(json!({ "status": "completed", "id": 77 }))).await.unwrap().unwrap();
        assert_eq!(updated["status"], json!("completed"));
        assert_eq!(updated["id"], json!(1));
        assert!(store.update("todos", "404", values(json!({ "status": "x" }))).await.unwrap().is_none());

        assert!(store.delete("todos", "1").await.unwrap());
        assert!(!store.delete("todos", "1").await.unwrap());
        assert!(!store.delete("nothing_here", "1").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_bad_table_names() {
        let store = MemoryStore::new();
        assert!(store.select("todos; drop", FilterData::default()).await.is_err());
    }
}
