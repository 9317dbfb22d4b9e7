use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};
use tracing::{debug, info, warn};

use super::store::{StoreError, TableStore};
use crate::config::{DatabaseConfig, PaginationConfig};
use crate::filter::{is_valid_identifier, Filter, FilterData, FilterError};
use crate::types::Row;

/// Postgres-backed store. Every statement returns rows through `row_to_json`
/// so column types never need to be known up front.
pub struct PgStore {
    pool: PgPool,
    max_limit: i32,
    query_logging: bool,
    slow_query_threshold: Duration,
}

impl PgStore {
    pub async fn connect(database: &DatabaseConfig, pagination: &PaginationConfig) -> Result<Self, StoreError> {
        let url = database.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let shown_url = redacted(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .acquire_timeout(Duration::from_secs(database.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database {}", shown_url);
        Ok(Self::from_pool(pool, database, pagination))
    }

    pub fn from_pool(pool: PgPool, database: &DatabaseConfig, pagination: &PaginationConfig) -> Self {
        Self {
            pool,
            max_limit: i32::try_from(pagination.max_limit).unwrap_or(i32::MAX),
            query_logging: database.enable_query_logging,
            slow_query_threshold: Duration::from_millis(database.slow_query_threshold_ms),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn filter_for(&self, table: &str) -> Result<Filter, FilterError> {
        let mut filter = Filter::new(table)?;
        filter.max_limit(Some(self.max_limit));
        Ok(filter)
    }

    fn log_query(&self, sql: &str, params: &[Value]) {
        if self.query_logging {
            debug!(sql, ?params, "executing query");
        }
    }

    fn observe(&self, sql: &str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed >= self.slow_query_threshold {
            warn!(elapsed_ms = elapsed.as_millis() as u64, sql, "slow query");
        }
    }

    async fn fetch_json_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, StoreError> {
        let wrapped = format!("SELECT row_to_json(t) AS row FROM ({}) t", sql);
        self.log_query(&wrapped, &params);

        let started = Instant::now();
        let mut query = sqlx::query(&wrapped);
        for param in params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        self.observe(&wrapped, started);

        rows.into_iter()
            .map(|row| match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(map),
                other => Err(StoreError::QueryError(format!("expected a JSON object row, got {}", other))),
            })
            .collect()
    }

    async fn fetch_returning(&self, sql: &str, params: Vec<Value>) -> Result<Option<Row>, StoreError> {
        self.log_query(sql, &params);

        let started = Instant::now();
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let row = query.fetch_optional(&self.pool).await?;
        self.observe(sql, started);

        match row {
            None => Ok(None),
            Some(row) => match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(Some(map)),
                other => Err(StoreError::QueryError(format!("expected a JSON object row, got {}", other))),
            },
        }
    }
}

#[async_trait]
impl TableStore for PgStore {
    async fn select(&self, table: &str, filter_data: FilterData) -> Result<Vec<Row>, StoreError> {
        let mut filter = self.filter_for(table)?;
        filter.assign(filter_data)?;
        let sql = filter.to_sql()?;
        self.fetch_json_rows(&sql.query, sql.params).await
    }

    async fn count(&self, table: &str, where_clause: Option<Value>) -> Result<i64, StoreError> {
        let mut filter = self.filter_for(table)?;
        if let Some(where_clause) = where_clause {
            filter.where_clause(where_clause)?;
        }
        let sql = filter.to_count_sql()?;
        self.log_query(&sql.query, &sql.params);

        let started = Instant::now();
        let mut query = sqlx::query(&sql.query);
        for param in sql.params {
            query = bind_param(query, param);
        }
        let row = query.fetch_one(&self.pool).await?;
        self.observe(&sql.query, started);
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn find_by_id(&self, table: &str, id: &str) -> Result<Option<Row>, StoreError> {
        let table = quoted(table)?;
        let sql = format!("SELECT * FROM {} WHERE \"id\"::text = $1", table);
        Ok(self.fetch_json_rows(&sql, vec![Value::String(id.to_string())]).await?.into_iter().next())
    }

    async fn insert(&self, table: &str, values: Row) -> Result<Row, StoreError> {
        let quoted_table = quoted(table)?;
        let columns = quoted_columns(&values)?;

        let (sql, params) = if columns.is_empty() {
            (
                format!(
                    "WITH ins AS (INSERT INTO {} DEFAULT VALUES RETURNING *) SELECT row_to_json(ins) AS row FROM ins",
                    quoted_table
                ),
                vec![],
            )
        } else {
            let list = columns.join(", ");
            (
                format!(
                    "WITH ins AS (INSERT INTO {t} ({c}) SELECT {c} FROM jsonb_populate_record(NULL::{t}, $1) RETURNING *) \
                     SELECT row_to_json(ins) AS row FROM ins",
                    t = quoted_table,
                    c = list
                ),
                vec![Value::Object(values)],
            )
        };

        self.fetch_returning(&sql, params)
            .await?
            .ok_or_else(|| StoreError::QueryError(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: &str, id: &str, values: Row) -> Result<Option<Row>, StoreError> {
        let quoted_table = quoted(table)?;
        let columns = quoted_columns(&values)?;
        if columns.is_empty() {
            return self.find_by_id(table, id).await;
        }

        let assignments = columns.iter().map(|c| format!("{c} = src.{c}")).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "WITH upd AS (UPDATE {t} AS target SET {a} FROM jsonb_populate_record(NULL::{t}, $1) AS src \
             WHERE target.\"id\"::text = $2 RETURNING target.*) SELECT row_to_json(upd) AS row FROM upd",
            t = quoted_table,
            a = assignments
        );
        self.fetch_returning(&sql, vec![Value::Object(values), Value::String(id.to_string())]).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE \"id\"::text = $1", quoted(table)?);
        self.log_query(&sql, &[]);

        let started = Instant::now();
        let result = sqlx::query(&sql).bind(id.to_string()).execute(&self.pool).await?;
        self.observe(&sql, started);
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn quoted(name: &str) -> Result<String, StoreError> {
    if !is_valid_identifier(name) {
        return Err(FilterError::InvalidTableName(name.to_string()).into());
    }
    Ok(format!("\"{}\"", name))
}

fn quoted_columns(values: &Row) -> Result<Vec<String>, StoreError> {
    values
        .keys()
        .map(|key| {
            if is_valid_identifier(key) {
                Ok(format!("\"{}\"", key))
            } else {
                Err(FilterError::InvalidColumn(key.clone()).into())
            }
        })
        .collect()
}

/// Connection string without the password, for logs.
fn redacted(url: &str) -> Result<String, StoreError> {
    let mut parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;
    if parsed.password().is_some() {
        parsed.set_password(Some("****")).map_err(|_| StoreError::InvalidDatabaseUrl)?;
    }
    Ok(parsed.to_string())
}

fn bind_param(query: Query<'_, Postgres, PgArguments>, value: Value) -> Query<'_, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        other => query.bind(other),
    }
}
