//! Per-option row counts for the status chips of a table page.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::database::{StoreError, TableStore};
use crate::filter::translate::{status_clause, ALL_STATUS};
use crate::filter::{matcher, FilterData, FilterError};
use crate::registry::{FilterDescriptor, TableDescriptor};
use crate::types::Row;

pub type StatusCounts = BTreeMap<String, i64>;

#[derive(Debug, thiserror::Error)]
enum CountError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Raw counts per declared status value. Failures are logged and yield an
/// empty map; counts only decorate the page.
pub async fn status_counts(store: &dyn TableStore, descriptor: &TableDescriptor) -> StatusCounts {
    let Some(filters) = &descriptor.filters else {
        return StatusCounts::new();
    };
    if filters.status_options.is_empty() {
        return StatusCounts::new();
    }

    let result = if filters.has_custom_filters() {
        count_per_option(store, &descriptor.table_name, filters).await
    } else {
        tally_status_field(store, &descriptor.table_name, filters).await
    };

    match result {
        Ok(counts) => counts,
        Err(e) => {
            warn!(table = %descriptor.table_name, "status counts unavailable: {}", e);
            StatusCounts::new()
        }
    }
}

/// One count query per option, since custom filters are arbitrary predicates.
async fn count_per_option(
    store: &dyn TableStore,
    table: &str,
    filters: &FilterDescriptor,
) -> Result<StatusCounts, CountError> {
    let mut counts = StatusCounts::new();
    for option in counted_options(filters) {
        let clause = status_clause(table, filters, &option.value)?;
        counts.insert(option.value.clone(), store.count(table, clause).await?);
    }
    Ok(counts)
}

/// Fetch just the status column and tally it.
async fn tally_status_field(
    store: &dyn TableStore,
    table: &str,
    filters: &FilterDescriptor,
) -> Result<StatusCounts, CountError> {
    let Some(field) = &filters.status_field else {
        return Ok(StatusCounts::new());
    };
    let rows = store
        .select(table, FilterData { select: Some(vec![field.clone()]), ..Default::default() })
        .await?;
    Ok(tally(field, &rows))
}

fn tally(field: &str, rows: &[Row]) -> StatusCounts {
    let mut counts = StatusCounts::new();
    for row in rows {
        let key = match row.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => continue,
            Some(other) => other.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Same counting over rows already in memory.
pub fn count_rows(descriptor: &TableDescriptor, rows: &[Row]) -> StatusCounts {
    let Some(filters) = &descriptor.filters else {
        return StatusCounts::new();
    };

    if !filters.has_custom_filters() {
        return match &filters.status_field {
            Some(field) => tally(field, rows),
            None => StatusCounts::new(),
        };
    }

    let mut counts = StatusCounts::new();
    for option in counted_options(filters) {
        let counted = status_clause(&descriptor.table_name, filters, &option.value).and_then(|clause| matcher::count_rows(rows, clause.as_ref()));
        match counted {
            Ok(n) => {
                counts.insert(option.value.clone(), n);
            }
            Err(e) => {
                warn!(table = %descriptor.table_name, "status counts unavailable: {}", e);
                return StatusCounts::new();
            }
        }
    }
    counts
}

/// `{all: sum, <value>: count}` for every declared option; missing entries are 0.
pub fn filter_counts(filters: &FilterDescriptor, counts: &StatusCounts) -> StatusCounts {
    let mut normalized = StatusCounts::new();
    let mut all = 0;
    for option in counted_options(filters) {
        let n = counts.get(&option.value).copied().unwrap_or(0);
        all += n;
        normalized.insert(option.value.clone(), n);
    }
    normalized.insert(ALL_STATUS.to_string(), all);
    normalized
}

fn counted_options(filters: &FilterDescriptor) -> impl Iterator<Item = &crate::registry::StatusOption> {
    filters.status_options.iter().filter(|o| o.value != ALL_STATUS)
}
