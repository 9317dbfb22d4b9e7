//! Translates a table request's `search` and `status` parameters into the
//! JSON filter language, using the table's registered filter metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::FilterError;
use super::types::FilterOp;
use crate::registry::{FilterDescriptor, TableDescriptor};

/// Status value that selects every row.
pub const ALL_STATUS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Neq => "neq",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }

    pub fn filter_op(&self) -> FilterOp {
        match self {
            CompareOp::Eq => FilterOp::Eq,
            CompareOp::Neq => FilterOp::Ne,
            CompareOp::Gt => FilterOp::Gt,
            CompareOp::Gte => FilterOp::Gte,
            CompareOp::Lt => FilterOp::Lt,
            CompareOp::Lte => FilterOp::Lte,
        }
    }
}

impl FromStr for CompareOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => CompareOp::Eq,
            "neq" => CompareOp::Neq,
            "gt" => CompareOp::Gt,
            "gte" => CompareOp::Gte,
            "lt" => CompareOp::Lt,
            "lte" => CompareOp::Lte,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }
}

/// A status option's custom predicate, written `field.operator.value`
/// (e.g. `is_verified.eq.true`). Everything after the second dot is the
/// value, so `price.gte.9.99` compares against `9.99`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatusFilter {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl StatusFilter {
    pub fn to_where(&self) -> Value {
        let mut ops = Map::new();
        ops.insert(self.op.filter_op().key().to_string(), self.value.clone());
        let mut clause = Map::new();
        clause.insert(self.field.clone(), Value::Object(ops));
        Value::Object(clause)
    }
}

impl FromStr for StatusFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let (field, op, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(f), Some(o), Some(v)) if !f.is_empty() && !o.is_empty() => (f, o, v),
            _ => return Err(FilterError::InvalidStatusFilter(s.to_string())),
        };
        if !super::is_valid_identifier(field) {
            return Err(FilterError::InvalidStatusFilter(s.to_string()));
        }
        Ok(Self { field: field.to_string(), op: op.parse()?, value: coerce_literal(raw) })
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        write!(f, "{}.{}.{}", self.field, self.op.as_str(), value)
    }
}

/// `true`/`false` become booleans, `null` becomes null, numeric literals become numbers.
fn coerce_literal(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::from(i)
            } else if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Value::Number(n)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

/// Escape LIKE metacharacters so a search term only ever matches literally.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// OR-group of case-insensitive substring matches, one per searchable field.
pub fn search_clause(fields: &[String], term: &str) -> Option<Value> {
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return None;
    }
    let pattern = format!("%{}%", escape_like(term));
    let alternatives: Vec<Value> = fields
        .iter()
        .map(|field| {
            let mut clause = Map::new();
            clause.insert(field.clone(), json!({ "$ilike": pattern }));
            Value::Object(clause)
        })
        .collect();
    Some(json!({ "$or": alternatives }))
}

/// Predicate for a status option. `None` when the status is empty or `all`.
pub fn status_clause(table: &str, filters: &FilterDescriptor, status: &str) -> Result<Option<Value>, FilterError> {
    let status = status.trim();
    if status.is_empty() || status == ALL_STATUS {
        return Ok(None);
    }

    let option = filters
        .status_options
        .iter()
        .find(|o| o.value == status)
        .ok_or_else(|| FilterError::UnknownStatus { table: table.to_string(), status: status.to_string() })?;

    if let Some(custom) = &option.filter {
        return Ok(Some(custom.to_where()));
    }

    Ok(filters.status_field.as_ref().map(|field| {
        let mut clause = Map::new();
        clause.insert(field.clone(), Value::String(option.value.clone()));
        Value::Object(clause)
    }))
}

/// Combined search + status predicate for a table; `None` means no filtering.
pub fn table_where(
    descriptor: &TableDescriptor,
    search: Option<&str>,
    status: Option<&str>,
) -> Result<Option<Value>, FilterError> {
    let filters = match &descriptor.filters {
        Some(filters) => filters,
        None => return Ok(None),
    };

    let mut clauses = Vec::new();
    if let Some(clause) = search.and_then(|term| search_clause(&filters.searchable_fields, term)) {
        clauses.push(clause);
    }
    if let Some(status) = status {
        if let Some(clause) = status_clause(&descriptor.table_name, filters, status)? {
            clauses.push(clause);
        }
    }

    Ok(match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    })
}
