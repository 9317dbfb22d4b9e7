pub mod body;
pub mod fragment;
pub mod response;

pub use body::InputBody;
pub use fragment::HxRequest;
pub use response::{ok_response, ApiResponse, ApiResult};
