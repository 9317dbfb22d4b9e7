use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    max_limit: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: None,
        })
    }

    /// Cap applied to any limit assigned after this call.
    pub fn max_limit(&mut self, max_limit: Option<i32>) -> &mut Self {
        self.max_limit = max_limit;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        else if let Some(offset) = data.offset { self.offset(offset)?; }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" && !is_valid_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = if conditions.is_null() { None } else { Some(conditions) };
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::NegativeWindow { field: "limit", value: limit }); }

        let applied_limit = match self.max_limit {
            Some(max) if limit > max => {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                max
            }
            _ => limit,
        };

        self.limit = Some(applied_limit);
        if let Some(off) = offset { self.offset(off)?; } else { self.offset = None; }
        Ok(self)
    }

    pub fn offset(&mut self, offset: i32) -> Result<&mut Self, FilterError> {
        if offset < 0 { return Err(FilterError::NegativeWindow { field: "offset", value: offset }); }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0)?,
            None => (String::new(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

/// Table and column names: ASCII letter or underscore first, then letters, digits, underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_bad_identifiers() {
        assert!(Filter::new("todos").is_ok());
        assert!(Filter::new("learning_content").is_ok());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1todos").is_err());
        assert!(Filter::new("todos; DROP TABLE todos").is_err());

        let mut filter = Filter::new("todos").unwrap();
        assert!(filter.select(vec!["title\"".to_string()]).is_err());
    }

    #[test]
    fn builds_select_with_where_order_and_window() {
        let mut filter = Filter::new("todos").unwrap();
        filter
            .assign(FilterData {
                select: Some(vec!["id".into(), "title".into()]),
                where_clause: Some(json!({ "status": "pending" })),
                order: Some(json!("created_at desc")),
                limit: Some(10),
                offset: Some(20),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"title\" FROM \"todos\" WHERE \"status\" = $1 ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("pending")]);
    }

    #[test]
    fn count_sql_ignores_window() {
        let mut filter = Filter::new("ideas").unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "is_featured": true })),
                limit: Some(5),
                ..Default::default()
            })
            .unwrap();

        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"ideas\" WHERE \"is_featured\" = $1");
        assert_eq!(sql.params, vec![json!(true)]);
    }

    #[test]
    fn caps_limit_at_max() {
        let mut filter = Filter::new("todos").unwrap();
        filter.max_limit(Some(100));
        filter.limit(500, None).unwrap();
        assert!(filter.to_sql().unwrap().query.ends_with("LIMIT 100"));
    }

    #[test]
    fn negative_window_is_rejected() {
        let mut filter = Filter::new("todos").unwrap();
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.limit(10, Some(-5)).is_err());
    }
}
