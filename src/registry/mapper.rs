//! Declarative row transforms applied before a table is rendered.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataMapper {
    /// Move a field to a new key.
    Rename { from: String, to: String },
    /// Format a numeric amount as a currency string, e.g. `$1,234.50`.
    Currency {
        field: String,
        #[serde(default)]
        currency_field: Option<String>,
        #[serde(default = "default_currency")]
        currency: String,
    },
    /// Cut long text to `max` characters with an ellipsis.
    Truncate { field: String, max: usize },
    /// Join an array field into one string.
    Join {
        field: String,
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// Render a boolean as a label, optionally into another key.
    BooleanLabel {
        field: String,
        #[serde(default)]
        target: Option<String>,
        true_label: String,
        false_label: String,
    },
    /// Fill a missing or null field.
    Default { field: String, value: Value },
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_separator() -> String {
    ", ".to_string()
}

impl DataMapper {
    pub fn apply(&self, row: &mut Row) {
        match self {
            DataMapper::Rename { from, to } => {
                if let Some(value) = row.remove(from) {
                    row.insert(to.clone(), value);
                }
            }
            DataMapper::Currency { field, currency_field, currency } => {
                let code = currency_field
                    .as_ref()
                    .and_then(|f| row.get(f))
                    .and_then(Value::as_str)
                    .unwrap_or(currency)
                    .to_string();
                if let Some(formatted) = row.get(field).and_then(|v| format_currency(v, &code)) {
                    row.insert(field.clone(), Value::String(formatted));
                }
            }
            DataMapper::Truncate { field, max } => {
                if let Some(Value::String(text)) = row.get(field) {
                    if text.chars().count() > *max {
                        let cut: String = text.chars().take(*max).collect();
                        row.insert(field.clone(), Value::String(format!("{}…", cut.trim_end())));
                    }
                }
            }
            DataMapper::Join { field, separator } => {
                if let Some(Value::Array(items)) = row.get(field) {
                    let joined = items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(separator);
                    row.insert(field.clone(), Value::String(joined));
                }
            }
            DataMapper::BooleanLabel { field, target, true_label, false_label } => {
                let truthy = match row.get(field) {
                    Some(Value::Bool(b)) => Some(*b),
                    Some(Value::String(s)) => s.parse::<bool>().ok(),
                    _ => None,
                };
                if let Some(truthy) = truthy {
                    let label = if truthy { true_label } else { false_label };
                    row.insert(target.clone().unwrap_or_else(|| field.clone()), Value::String(label.clone()));
                }
            }
            DataMapper::Default { field, value } => {
                if row.get(field).map_or(true, Value::is_null) {
                    row.insert(field.clone(), value.clone());
                }
            }
        }
    }
}

pub fn apply_mappers(mappers: &[DataMapper], rows: Vec<Row>) -> Vec<Row> {
    if mappers.is_empty() {
        return rows;
    }
    rows.into_iter()
        .map(|mut row| {
            for mapper in mappers {
                mapper.apply(&mut row);
            }
            row
        })
        .collect()
}

fn format_currency(value: &Value, code: &str) -> Option<String> {
    let amount = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok()?,
        Value::String(s) => Decimal::from_str(s.trim()).ok()?,
        _ => return None,
    };

    let rounded = amount.round_dp(2);
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let prefix = match code.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        other => format!("{} ", other),
    };
    Some(format!("{}{}{}.{}", sign, prefix, grouped, cents))
}
