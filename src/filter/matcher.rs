//! In-memory evaluation of the filter language.
//!
//! Mirrors what `FilterWhere` asks Postgres to do, so row sets that never
//! reach the database (synthetic views, the in-process store) filter, sort
//! and paginate the same way.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::{FilterData, FilterOp, FilterOrderInfo, SortDirection};
use crate::types::Row;

#[derive(Debug, Clone)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare { field: String, op: FilterOp, value: Value },
    Like { field: String, pattern: Regex },
    In { field: String, values: Vec<Value> },
    Between { field: String, lower: Value, upper: Value },
}

impl Predicate {
    pub fn compile(where_data: &Value) -> Result<Self, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(Predicate::All(vec![])),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("expected an object".to_string())),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "$and" | "$or" => {
                    let arr = value
                        .as_array()
                        .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", key)))?;
                    let children = arr.iter().map(Self::compile).collect::<Result<Vec<_>, _>>()?;
                    parts.push(if key == "$and" { Predicate::All(children) } else { Predicate::Any(children) });
                }
                "$not" => parts.push(Predicate::Not(Box::new(Self::compile(value)?))),
                k if k.starts_with('$') => return Err(FilterError::UnsupportedOperator(k.to_string())),
                field => parts.extend(Self::compile_field(field, value)?),
            }
        }

        Ok(if parts.len() == 1 { parts.remove(0) } else { Predicate::All(parts) })
    }

    fn compile_field(field: &str, value: &Value) -> Result<Vec<Predicate>, FilterError> {
        let ops = match value {
            Value::Object(ops) => ops,
            other => {
                return Ok(vec![Predicate::Compare { field: field.to_string(), op: FilterOp::Eq, value: other.clone() }]);
            }
        };

        let mut out = Vec::new();
        for (op_key, data) in ops {
            let op = FilterOp::from_key(op_key).ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
            let field = field.to_string();
            out.push(match op {
                FilterOp::Like | FilterOp::ILike => {
                    let raw = data
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires a string pattern", op_key)))?;
                    Predicate::Like { field, pattern: like_to_regex(raw, op == FilterOp::ILike)? }
                }
                FilterOp::In => match data {
                    Value::Array(values) => Predicate::In { field, values: values.clone() },
                    single => Predicate::Compare { field, op: FilterOp::Eq, value: single.clone() },
                },
                FilterOp::Between => match data.as_array().map(|a| a.as_slice()) {
                    Some([lower, upper]) => Predicate::Between { field, lower: lower.clone(), upper: upper.clone() },
                    _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
                },
                _ => Predicate::Compare { field, op, value: data.clone() },
            });
        }
        Ok(out)
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::All(children) => children.iter().all(|p| p.matches(row)),
            Predicate::Any(children) => children.iter().any(|p| p.matches(row)),
            Predicate::Not(inner) => !inner.matches(row),
            Predicate::Compare { field, op, value } => {
                let actual = row.get(field).unwrap_or(&Value::Null);
                compare_op(actual, *op, value)
            }
            Predicate::Like { field, pattern } => match row.get(field).and_then(text_of) {
                Some(text) => pattern.is_match(&text),
                None => false,
            },
            Predicate::In { field, values } => {
                let actual = row.get(field).unwrap_or(&Value::Null);
                values.iter().any(|v| loose_eq(actual, v))
            }
            Predicate::Between { field, lower, upper } => {
                let actual = row.get(field).unwrap_or(&Value::Null);
                matches!(compare(actual, lower), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, upper), Some(Ordering::Less | Ordering::Equal))
            }
        }
    }
}

/// Filter, order, window and project `rows` the way the SQL path would.
pub fn apply(rows: Vec<Row>, filter: &FilterData) -> Result<Vec<Row>, FilterError> {
    let mut rows = filter_rows(rows, filter.where_clause.as_ref())?;

    if let Some(order) = &filter.order {
        let infos = FilterOrder::validate_and_parse(order)?;
        sort_rows(&mut rows, &infos);
    }

    let offset = filter.offset.unwrap_or(0).max(0) as usize;
    let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
    let windowed = rows.into_iter().skip(offset).take(limit);

    Ok(match &filter.select {
        Some(columns) if !columns.is_empty() && !columns.iter().any(|c| c == "*") => windowed
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect(),
        _ => windowed.collect(),
    })
}

pub fn filter_rows(rows: Vec<Row>, where_clause: Option<&Value>) -> Result<Vec<Row>, FilterError> {
    match where_clause {
        None | Some(Value::Null) => Ok(rows),
        Some(where_data) => {
            let predicate = Predicate::compile(where_data)?;
            Ok(rows.into_iter().filter(|row| predicate.matches(row)).collect())
        }
    }
}

pub fn count_rows(rows: &[Row], where_clause: Option<&Value>) -> Result<i64, FilterError> {
    match where_clause {
        None | Some(Value::Null) => Ok(rows.len() as i64),
        Some(where_data) => {
            let predicate = Predicate::compile(where_data)?;
            Ok(rows.iter().filter(|row| predicate.matches(row)).count() as i64)
        }
    }
}

/// Stable sort; nulls sort last ascending and first descending, as in Postgres.
pub fn sort_rows(rows: &mut [Row], infos: &[FilterOrderInfo]) {
    rows.sort_by(|a, b| {
        for info in infos {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn compare_op(actual: &Value, op: FilterOp, expected: &Value) -> bool {
    match op {
        FilterOp::Eq => {
            if expected.is_null() { actual.is_null() } else { loose_eq(actual, expected) }
        }
        FilterOp::Ne => {
            if expected.is_null() { !actual.is_null() } else { !actual.is_null() && !loose_eq(actual, expected) }
        }
        FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.trim().parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.trim().parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::String(y)) | (Value::String(y), Value::Bool(x)) => {
            let parsed = y.parse::<bool>().ok()?;
            if matches!(a, Value::Bool(_)) { Some(x.cmp(&parsed)) } else { Some(parsed.cmp(x)) }
        }
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Translate a SQL LIKE pattern (`%`, `_`, backslash escapes) into an anchored regex.
pub fn like_to_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, FilterError> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str(if case_insensitive { "(?is)^" } else { "(?s)^" });

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Ok(Regex::new(&out)?)
}
