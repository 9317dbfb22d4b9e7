pub mod bulk;
pub mod crud_service;
pub mod pagination;
pub mod status_counts;
pub mod table_service;
pub mod votes;

pub use bulk::{BulkOperation, BulkOutcome, BulkRequest, BulkService};
pub use crud_service::CrudService;
pub use pagination::{PaginationState, TableParams, TableRequest};
pub use status_counts::{filter_counts, status_counts, StatusCounts};
pub use table_service::{TablePage, TableService};
