mod auth;
mod health_check;

pub use auth::{get_current_user, login, logout, refresh, register};
pub use health_check::health_check;

use crate::error::AppError;

/// Fallback for unmatched routes
pub async fn not_found() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFound("Route".to_string()))
}
