pub mod auth;
pub mod response;

pub use auth::{require_user, AuthUser, ScopedClient};
pub use response::{ApiResponse, ApiResult};
