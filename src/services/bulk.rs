//! Bulk actions: one operation over a caller-supplied list of ids, run
//! sequentially, each id succeeding or failing on its own.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::database::TableStore;
use crate::error::{ApiError, FieldErrors};
use crate::registry::TableDescriptor;
use crate::types::{id_string, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    Activate,
    Deactivate,
    Delete,
}

impl BulkOperation {
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim() {
            "activate" => Some(Self::Activate),
            "deactivate" => Some(Self::Deactivate),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    pub operation: BulkOperation,
    pub ids: Vec<String>,
}

impl BulkRequest {
    /// `{action, ids}` where `ids` is an array of strings or numbers, or a
    /// comma-separated string as sent by forms.
    pub fn from_value(body: &Value) -> Result<Self, ApiError> {
        let mut field_errors = FieldErrors::new();

        let operation = match body.get("action").and_then(Value::as_str) {
            Some(action) => BulkOperation::parse(action),
            None => None,
        };
        if operation.is_none() {
            field_errors.insert("action".into(), vec!["Action must be activate, deactivate or delete".into()]);
        }

        let ids = parse_ids(body.get("ids"));
        if ids.is_empty() {
            field_errors.insert("ids".into(), vec!["At least one id is required".into()]);
        }

        match operation {
            Some(operation) if field_errors.is_empty() => Ok(Self { operation, ids }),
            _ => Err(ApiError::unprocessable_entity("Invalid bulk request", field_errors)),
        }
    }
}

fn parse_ids(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(id_string).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    };
    raw.into_iter().map(|id| id.trim().to_string()).filter(|id| !id.is_empty()).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub action: BulkOperation,
    pub results: Vec<Value>,
    pub errors: Vec<Value>,
}

#[derive(Clone)]
pub struct BulkService {
    store: Arc<dyn TableStore>,
}

impl BulkService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Every id is attempted; failures are collected, never fatal to the batch.
    pub async fn run(&self, descriptor: &TableDescriptor, request: BulkRequest) -> Result<BulkOutcome, ApiError> {
        let table = descriptor.table_name.as_str();
        let operation = request.operation;
        if !descriptor.bulk_actions.iter().any(|a| a.action == operation.as_str()) {
            return Err(ApiError::bad_request(format!(
                "Action '{}' is not available for table '{}'",
                operation.as_str(),
                table
            )));
        }

        let mut outcome = BulkOutcome { action: operation, results: Vec::new(), errors: Vec::new() };
        for id in request.ids {
            match self.apply(table, operation, &id).await {
                Ok(()) => outcome.results.push(json!({ "id": id, "success": true })),
                Err(e) => {
                    warn!(table, id = %id, action = operation.as_str(), "bulk item failed: {}", e);
                    outcome.errors.push(json!({ "id": id, "error": e.message() }));
                }
            }
        }

        info!(
            table,
            action = operation.as_str(),
            succeeded = outcome.results.len(),
            failed = outcome.errors.len(),
            "bulk action finished"
        );
        Ok(outcome)
    }

    async fn apply(&self, table: &str, operation: BulkOperation, id: &str) -> Result<(), ApiError> {
        match operation {
            BulkOperation::Activate | BulkOperation::Deactivate => {
                let mut values = Row::new();
                values.insert("is_active".into(), Value::Bool(operation == BulkOperation::Activate));
                self.store
                    .update(table, id, values)
                    .await?
                    .map(|_| ())
                    .ok_or_else(|| ApiError::record_not_found(table, id))
            }
            BulkOperation::Delete => {
                if self.store.delete(table, id).await? {
                    Ok(())
                } else {
                    Err(ApiError::record_not_found(table, id))
                }
            }
        }
    }
}
