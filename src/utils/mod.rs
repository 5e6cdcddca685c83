pub mod error;
pub mod pagination;
pub mod response;
pub mod types;
pub mod validated;

pub use error::{db_error, handler_404, ApiError};
pub use response::ApiResponse;
pub use validated::ValidatedJson;
