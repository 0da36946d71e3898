pub mod comments;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod notifications;
pub mod projects;
pub mod search;
pub mod tracks;
pub mod users;

use armed_core::SocialError;
use axum::http::StatusCode;

/// Error half of every API handler result.
pub type ApiError = (StatusCode, String);

/// Map a core error to its HTTP status and public message.
pub fn social_error(err: SocialError) -> ApiError {
    let status = match &err {
        SocialError::NotFound(_) => StatusCode::NOT_FOUND,
        SocialError::Conflict(_) => StatusCode::CONFLICT,
        SocialError::InvalidOperation(_) | SocialError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SocialError::Forbidden(_) => StatusCode::FORBIDDEN,
        SocialError::Database(e) => {
            tracing::error!(error = %e, "database error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.public_message())
}
