//! The `votes_management` view: vote counters of ideas and portfolios
//! flattened into one row per source record and direction.

use serde_json::{json, Value};

use crate::database::{StoreError, TableStore};
use crate::filter::{matcher, FilterData, FilterOrderInfo, SortDirection};
use crate::types::{id_string, Row};

pub const VOTES_TABLE: &str = "votes_management";

pub const VOTE_SOURCES: [&str; 2] = ["ideas", "portfolios"];

/// Every synthetic vote row, newest source record first.
pub async fn vote_rows(store: &dyn TableStore) -> Result<Vec<Row>, StoreError> {
    let columns = ["id", "title", "upvotes", "downvotes", "created_at"];

    let mut rows = Vec::new();
    for source in VOTE_SOURCES {
        let fetched = store
            .select(
                source,
                FilterData {
                    select: Some(columns.iter().map(|c| c.to_string()).collect()),
                    ..Default::default()
                },
            )
            .await?;
        rows.extend(flatten(source, &fetched));
    }

    matcher::sort_rows(
        &mut rows,
        &[FilterOrderInfo { column: "created_at".to_string(), sort: SortDirection::Desc }],
    );
    Ok(rows)
}

/// One row per non-zero counter: id `<source>-<id>-<up|down>`.
pub fn flatten(source: &str, records: &[Row]) -> Vec<Row> {
    let mut out = Vec::new();
    for record in records {
        let Some(id) = record.get("id").and_then(id_string) else {
            continue;
        };
        for (direction, column) in [("up", "upvotes"), ("down", "downvotes")] {
            let count = counter(record.get(column));
            if count == 0 {
                continue;
            }
            let row = json!({
                "id": format!("{}-{}-{}", source, id, direction),
                "source_type": source,
                "source_id": id,
                "title": record.get("title").cloned().unwrap_or(Value::Null),
                "vote_type": direction,
                "count": count,
                "created_at": record.get("created_at").cloned().unwrap_or(Value::Null),
            });
            if let Value::Object(map) = row {
                out.push(map);
            }
        }
    }
    out
}

fn counter(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
