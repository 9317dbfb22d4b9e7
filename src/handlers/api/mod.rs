// handlers/api/mod.rs - JSON endpoints
//
// Resource handlers answer HTMX requests with HTML fragments as well.

pub mod bulk;      // POST /api/bulk/users
pub mod resources; // /api/{todos,users,ideas}[/:id]
pub mod tables;    // GET /api/tables, GET /api/tables/:table_name/counts

pub use bulk::bulk_users;
pub use resources::{resource_create, resource_delete, resource_get, resource_list, resource_update};
pub use tables::{table_counts, tables_list};
