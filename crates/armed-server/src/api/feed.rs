use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use armed_core::feed::Feed;
use armed_core::PaginationParams;

/// GET /api/feed?limit=&offset= (auth required)
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Feed>, ApiError> {
    let feed = state
        .social
        .get_feed(auth_user.id(), params.into())
        .await
        .map_err(social_error)?;
    Ok(Json(feed))
}
