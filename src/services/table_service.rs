use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::pagination::{PaginationState, TableRequest};
use super::status_counts::{self, StatusCounts};
use super::votes::{self, VOTES_TABLE};
use crate::database::TableStore;
use crate::error::ApiError;
use crate::filter::translate::table_where;
use crate::filter::{matcher, FilterData};
use crate::registry::{apply_mappers, Action, TableDescriptor};
use crate::types::Row;

/// Everything a table page or fragment needs.
#[derive(Debug, Clone)]
pub struct TablePage {
    pub descriptor: Arc<TableDescriptor>,
    pub actions: Vec<Action>,
    pub request: TableRequest,
    pub rows: Vec<Row>,
    pub pagination: PaginationState,
    pub filter_counts: StatusCounts,
}

/// JSON shape of a list response.
#[derive(Debug, Serialize)]
pub struct TableData<'a> {
    pub table: &'a str,
    pub rows: &'a [Row],
    pub pagination: &'a PaginationState,
    pub filter_counts: &'a StatusCounts,
}

impl TablePage {
    /// Page with no rows, used when loading failed.
    pub fn empty(descriptor: Arc<TableDescriptor>, request: TableRequest) -> Self {
        let pagination = PaginationState::new(request.page, request.limit, 0);
        Self {
            actions: descriptor.merged_actions(),
            descriptor,
            request,
            rows: Vec::new(),
            pagination,
            filter_counts: StatusCounts::new(),
        }
    }

    /// Rows after the table's mappers, ready for display.
    pub fn mapped_rows(&self) -> Vec<Row> {
        apply_mappers(&self.descriptor.mappers, self.rows.clone())
    }

    pub fn data(&self) -> TableData<'_> {
        TableData {
            table: &self.descriptor.table_name,
            rows: &self.rows,
            pagination: &self.pagination,
            filter_counts: &self.filter_counts,
        }
    }
}

/// Generic fetch, filter, count and paginate over any registered table.
#[derive(Clone)]
pub struct TableService {
    store: Arc<dyn TableStore>,
}

impl TableService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, descriptor: Arc<TableDescriptor>, request: TableRequest) -> Result<TablePage, ApiError> {
        let where_clause = table_where(&descriptor, request.search.as_deref(), request.status.as_deref())?;
        debug!(table = %descriptor.table_name, ?where_clause, page = request.page, limit = request.limit, "loading table");

        let (rows, total, counts) = if descriptor.table_name == VOTES_TABLE {
            self.load_votes(&descriptor, &request, where_clause).await?
        } else {
            self.load_rows(&descriptor, &request, where_clause).await?
        };

        let filter_counts = match &descriptor.filters {
            Some(filters) if !filters.status_options.is_empty() => status_counts::filter_counts(filters, &counts),
            _ => StatusCounts::new(),
        };

        Ok(TablePage {
            actions: descriptor.merged_actions(),
            pagination: PaginationState::new(request.page, request.limit, total),
            descriptor,
            request,
            rows,
            filter_counts,
        })
    }

    /// Chip counts alone, without loading a page of rows.
    pub async fn counts(&self, descriptor: &TableDescriptor) -> Result<StatusCounts, ApiError> {
        let Some(filters) = descriptor.filters.as_ref().filter(|f| !f.status_options.is_empty()) else {
            return Ok(StatusCounts::new());
        };
        let counts = if descriptor.table_name == VOTES_TABLE {
            let rows = votes::vote_rows(self.store.as_ref()).await?;
            status_counts::count_rows(descriptor, &rows)
        } else {
            status_counts::status_counts(self.store.as_ref(), descriptor).await
        };
        Ok(status_counts::filter_counts(filters, &counts))
    }

    async fn load_rows(
        &self,
        descriptor: &TableDescriptor,
        request: &TableRequest,
        where_clause: Option<Value>,
    ) -> Result<(Vec<Row>, u64, StatusCounts), ApiError> {
        let table = &descriptor.table_name;
        let total = self.store.count(table, where_clause.clone()).await?;

        let filter = FilterData {
            select: None,
            where_clause,
            order: descriptor.default_order.clone().map(Value::String),
            limit: Some(i32::try_from(request.limit).unwrap_or(i32::MAX)),
            offset: Some(i32::try_from(request.offset()).unwrap_or(i32::MAX)),
        };
        let rows = self.store.select(table, filter).await?;
        let counts = status_counts::status_counts(self.store.as_ref(), descriptor).await;

        Ok((rows, u64::try_from(total).unwrap_or(0), counts))
    }

    async fn load_votes(
        &self,
        descriptor: &TableDescriptor,
        request: &TableRequest,
        where_clause: Option<Value>,
    ) -> Result<(Vec<Row>, u64, StatusCounts), ApiError> {
        let all = votes::vote_rows(self.store.as_ref()).await?;
        let counts = status_counts::count_rows(descriptor, &all);

        let matching = matcher::filter_rows(all, where_clause.as_ref())?;
        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let rows = matching.into_iter().skip(offset).take(request.limit as usize).collect();

        Ok((rows, total, counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::database::MemoryStore;
    use crate::registry::TableRegistry;
    use crate::services::pagination::TableParams;
    use serde_json::json;

    fn request(search: Option<&str>, status: Option<&str>, page: u32, limit: u32) -> TableRequest {
        TableRequest::from_params(
            TableParams {
                search: search.map(String::from),
                status: status.map(String::from),
                page: Some(page.to_string()),
                limit: Some(limit.to_string()),
            },
            &PaginationConfig { default_limit: 10, max_limit: 100 },
        )
    }

    fn service(yaml: &str) -> TableService {
        TableService::new(Arc::new(MemoryStore::from_yaml(yaml).unwrap()))
    }

    #[tokio::test]
    async fn search_matches_any_field_ignoring_case() {
        let service = service(
            r#"
ideas:
  - { id: 1, title: Coffee cart, description: "A pre-launch plan for a coffee cart", status: draft }
  - { id: 2, title: Bike share, description: Rentals by the hour, status: draft }
"#,
        );
        let ideas = TableRegistry::builtin().unwrap().get("ideas").unwrap();

        let page = service.load(ideas, request(Some("LAUNCH"), None, 1, 10)).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.rows[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let service = service("todos: []");
        let todos = TableRegistry::builtin().unwrap().get("todos").unwrap();
        let err = service.load(todos, request(None, Some("someday"), 1, 10)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn votes_view_filters_and_slices_in_memory() {
        let service = service(
            r#"
ideas:
  - { id: 1, title: Alpha, upvotes: 3, downvotes: 1, created_at: "2024-01-01T00:00:00Z" }
  - { id: 2, title: Beta, upvotes: 0, downvotes: 2, created_at: "2024-02-01T00:00:00Z" }
portfolios:
  - { id: 9, title: Gamma, upvotes: 5, downvotes: 0, created_at: "2024-03-01T00:00:00Z" }
"#,
        );
        let votes = TableRegistry::builtin().unwrap().get(VOTES_TABLE).unwrap();

        let page = service.load(votes.clone(), request(None, Some("down"), 1, 10)).await.unwrap();
        let ids: Vec<&str> = page.rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["ideas-2-down", "ideas-1-down"]);
        assert_eq!(page.filter_counts["up"], 2);
        assert_eq!(page.filter_counts["down"], 2);
        assert_eq!(page.filter_counts["all"], 4);
        assert!(page.actions.is_empty());

        let page = service.load(votes, request(None, None, 2, 3)).await.unwrap();
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["id"], json!("ideas-1-down"));
    }

    #[tokio::test]
    async fn mappers_apply_only_for_display() {
        let service = service(
            r#"
billings:
  - { id: 1, invoice_number: INV-1, amount: 1500, currency: USD, status: paid }
"#,
        );
        let billings = TableRegistry::builtin().unwrap().get("billings").unwrap();
        let page = service.load(billings, request(None, Some("large"), 1, 10)).await.unwrap();
        assert_eq!(page.rows[0]["amount"], json!(1500));
        assert_eq!(page.mapped_rows()[0]["amount"], json!("$1,500.00"));
    }
}
