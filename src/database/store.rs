use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::filter::{FilterData, FilterError};
use crate::types::Row;

/// Errors from a table store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Connection-level failures, as opposed to a bad query.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_))
        )
    }
}

/// The datastore contract: filtered and windowed reads plus writes by id.
///
/// Rows are untyped JSON maps so one implementation serves every
/// registered table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, filter: FilterData) -> Result<Vec<Row>, StoreError>;

    async fn count(&self, table: &str, where_clause: Option<Value>) -> Result<i64, StoreError>;

    async fn find_by_id(&self, table: &str, id: &str) -> Result<Option<Row>, StoreError>;

    async fn insert(&self, table: &str, values: Row) -> Result<Row, StoreError>;

    /// `None` when no row has this id.
    async fn update(&self, table: &str, id: &str, values: Row) -> Result<Option<Row>, StoreError>;

    /// `false` when no row has this id.
    async fn delete(&self, table: &str, id: &str) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
