use std::collections::HashMap;

use tera::{Result, Tera, Value};

use super::view::humanize;

/// Registers the filters used by the admin templates:
/// - `status_class`: badge CSS class for a status value
/// - `humanize`: `in_progress` to `In progress`
pub fn register_filters(tera: &mut Tera) {
    tera.register_filter("status_class", status_class);
    tera.register_filter("humanize", humanize_filter);
}

fn extract_str<'a>(value: &'a Value, filter_name: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter only applies to strings", filter_name)))
}

fn status_class(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let status = extract_str(value, "status_class")?.to_ascii_lowercase();
    let class = match status.as_str() {
        "active" | "completed" | "published" | "paid" | "verified" | "up" | "read" | "yes" => "badge-success",
        "pending" | "in_progress" | "draft" | "trial" | "unread" | "new" => "badge-warning",
        "inactive" | "archived" | "suspended" | "unpaid" | "down" | "overdue" | "no" => "badge-danger",
        _ => "badge-neutral",
    };
    Ok(Value::String(class.to_string()))
}

fn humanize_filter(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let s = extract_str(value, "humanize")?;
    Ok(Value::String(humanize(s)))
}
