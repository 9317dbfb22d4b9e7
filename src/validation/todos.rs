use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{coerce, one_of, rule, Resource};

pub const TODO_STATUSES: [&str; 3] = ["pending", "in_progress", "completed"];
pub const TODO_PRIORITIES: [&str; 3] = ["low", "medium", "high"];

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct TodoInput {
    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_due_date"))]
    pub due_date: Option<String>,
}

impl Resource for TodoInput {
    const TABLE: &'static str = "todos";
    const REQUIRED: &'static [&'static str] = &["title"];

    fn apply_defaults(&mut self) {
        self.status.get_or_insert_with(|| "pending".to_string());
        self.priority.get_or_insert_with(|| "medium".to_string());
    }
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    one_of(value, &TODO_STATUSES, "Status must be pending, in_progress or completed")
}

fn validate_priority(value: &str) -> Result<(), ValidationError> {
    one_of(value, &TODO_PRIORITIES, "Priority must be low, medium or high")
}

fn validate_due_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| rule("date", "Due date must be a date in YYYY-MM-DD format"))
}
