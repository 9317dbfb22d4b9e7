use serde_json::Value;

use super::error::FilterError;
use super::filter::is_valid_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders a JSON where-clause into a parameterized Postgres predicate.
///
/// Placeholders are numbered continuously across nested `$and`/`$or`/`$not`
/// groups, starting after `starting_param_index`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let conditions = filter_where.parse_where_data(where_data)?;
        Ok((conditions.join(" AND "), filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("expected an object".to_string())),
        }
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<Vec<String>, FilterError> {
        let obj = match where_data {
            Value::Object(obj) => obj,
            Value::Null => return Ok(vec![]),
            _ => return Err(FilterError::InvalidWhereClause("expected an object or an array of objects".to_string())),
        };

        let mut conditions = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                conditions.push(self.parse_logical_operator(key, value)?);
            } else {
                conditions.extend(self.parse_field_condition(key, value)?);
            }
        }
        Ok(conditions)
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    let inner = self.parse_where_data(v)?;
                    let part = if inner.is_empty() { "1=1".to_string() } else { inner.join(" AND ") };
                    sql_parts.push(format!("({})", part));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => {
                let inner = self.parse_where_data(value)?;
                let part = if inner.is_empty() { "1=1".to_string() } else { inner.join(" AND ") };
                Ok(format!("NOT ({})", part))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        let mut out = Vec::new();
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = FilterOp::from_key(op_key)
                    .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                let info = FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() };
                out.push(self.build_sql_condition(&info)?);
            }
        } else {
            // Implicit equality: { field: value }
            let info = FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() };
            out.push(self.build_sql_condition(&info)?);
        }
        Ok(out)
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = condition.data.clone();
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else { Ok(format!("{} = {}", quoted_column, self.param(data))) }
            }
            FilterOp::Ne => {
                if data.is_null() { Ok(format!("{} IS NOT NULL", quoted_column)) }
                else { Ok(format!("{} <> {}", quoted_column, self.param(data))) }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(data))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(data))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data))),
            FilterOp::Like => Ok(format!("{}::text LIKE {}", quoted_column, self.param(data))),
            FilterOp::ILike => Ok(format!("{}::text ILIKE {}", quoted_column, self.param(data))),
            FilterOp::In => {
                if let Value::Array(values) = data {
                    if values.is_empty() { return Ok("1=0".to_string()); }
                    let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(data)))
                }
            }
            FilterOp::Between => match data {
                Value::Array(mut values) if values.len() == 2 => {
                    let upper = values.pop().unwrap_or(Value::Null);
                    let lower = values.pop().unwrap_or(Value::Null);
                    Ok(format!("{} BETWEEN {} AND {}", quoted_column, self.param(lower), self.param(upper)))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_group_numbers_params_continuously() {
        let where_data = json!({
            "$and": [
                { "$or": [
                    { "title": { "$ilike": "%milk%" } },
                    { "description": { "$ilike": "%milk%" } }
                ]},
                { "status": "pending" }
            ]
        });

        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(
            sql,
            "((((\"title\"::text ILIKE $1) OR (\"description\"::text ILIKE $2))) AND (\"status\" = $3))"
        );
        assert_eq!(params, vec![json!("%milk%"), json!("%milk%"), json!("pending")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "deleted_at": null }), 0).unwrap();
        assert_eq!(sql, "\"deleted_at\" IS NULL");
        assert!(params.is_empty());

        let (sql, _) = FilterWhere::generate(&json!({ "deleted_at": { "$ne": null } }), 0).unwrap();
        assert_eq!(sql, "\"deleted_at\" IS NOT NULL");
    }

    #[test]
    fn in_and_between() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [1, 2, 3] } }), 0).unwrap();
        assert_eq!(sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);

        let (sql, _) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");

        let (sql, params) = FilterWhere::generate(&json!({ "upvotes": { "$between": [1, 10] } }), 0).unwrap();
        assert_eq!(sql, "\"upvotes\" BETWEEN $1 AND $2");
        assert_eq!(params, vec![json!(1), json!(10)]);

        assert!(FilterWhere::generate(&json!({ "upvotes": { "$between": [1] } }), 0).is_err());
    }

    #[test]
    fn rejects_unknown_operators_and_columns() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "title": { "$regex": "x" } }), 0),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "title\" OR 1=1 --": "x" }), 0),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(FilterWhere::validate(&json!("1=1")).is_err());
    }

    #[test]
    fn not_wraps_group() {
        let (sql, params) = FilterWhere::generate(&json!({ "$not": { "is_active": true } }), 0).unwrap();
        assert_eq!(sql, "NOT (\"is_active\" = $1)");
        assert_eq!(params, vec![json!(true)]);
    }
}
