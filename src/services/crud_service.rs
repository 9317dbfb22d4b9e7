use std::sync::Arc;

use tracing::info;

use crate::database::TableStore;
use crate::error::ApiError;
use crate::types::Row;

/// Single-record operations by id. Missing rows are `NotFound` every time.
#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn TableStore>,
}

impl CrudService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, table: &str, id: &str) -> Result<Row, ApiError> {
        self.store
            .find_by_id(table, id)
            .await?
            .ok_or_else(|| ApiError::record_not_found(table, id))
    }

    pub async fn create(&self, table: &str, values: Row) -> Result<Row, ApiError> {
        let row = self.store.insert(table, values).await?;
        info!(table, id = ?row.get("id"), "record created");
        Ok(row)
    }

    /// Applies only the given fields; last writer wins.
    pub async fn update(&self, table: &str, id: &str, values: Row) -> Result<Row, ApiError> {
        let row = self
            .store
            .update(table, id, values)
            .await?
            .ok_or_else(|| ApiError::record_not_found(table, id))?;
        info!(table, id, "record updated");
        Ok(row)
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<(), ApiError> {
        if !self.store.delete(table, id).await? {
            return Err(ApiError::record_not_found(table, id));
        }
        info!(table, id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn service() -> CrudService {
        CrudService::new(Arc::new(
            MemoryStore::from_yaml("todos:\n  - { id: 1, title: Buy milk, status: pending }\n").unwrap(),
        ))
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_every_time() {
        let service = service();
        for _ in 0..2 {
            let err = service.delete("todos", "999").await.unwrap_err();
            assert_eq!(err.status_code(), 404);
        }
        service.delete("todos", "1").await.unwrap();
        assert_eq!(service.delete("todos", "1").await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let service = service();
        let mut values = Row::new();
        values.insert("status".into(), json!("completed"));

        assert_eq!(service.update("todos", "2", values.clone()).await.unwrap_err().status_code(), 404);
        let row = service.update("todos", "1", values).await.unwrap();
        assert_eq!(row["status"], json!("completed"));
        assert_eq!(row["title"], json!("Buy milk"));
    }
}
