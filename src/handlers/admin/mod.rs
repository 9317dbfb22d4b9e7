// handlers/admin/mod.rs - Metadata-driven admin pages
//
// Every handler answers with a full page, or with a fragment when the
// request carries `HX-Request: true`.

pub mod bulk;      // POST /admin/table-pages/:table_name/bulk
pub mod forms;     // GET /admin/table-pages/:table_name/new, .../rows/:id/edit
pub mod rows;      // GET|DELETE /admin/table-pages/:table_name/rows/:id
pub mod table_page; // GET /admin/table-pages[/:table_name]

pub use bulk::table_bulk;
pub use forms::{edit_form, new_form};
pub use rows::{row_delete, row_detail};
pub use table_page::{table_index, table_page};
