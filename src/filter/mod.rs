pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod matcher;
pub mod translate;
pub mod types;

pub use error::FilterError;
pub use filter::{is_valid_identifier, Filter};
pub use types::*;
