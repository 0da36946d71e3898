use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use armed_core::likes::{LikeWithTrack, LikeWithUser};
use armed_db::entities::like;

#[derive(Debug, Serialize)]
pub struct LikeStatus {
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeCount {
    pub count: u64,
}

/// POST /api/likes/{track_id} (auth required)
pub async fn like_track(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(track_id): Path<Uuid>,
) -> Result<(StatusCode, Json<like::Model>), ApiError> {
    let like = state
        .social
        .like(auth_user.id(), track_id)
        .await
        .map_err(social_error)?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// DELETE /api/likes/{track_id} (auth required)
pub async fn unlike_track(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(track_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .social
        .unlike(auth_user.id(), track_id)
        .await
        .map_err(social_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/likes/{track_id}
pub async fn list_track_likes(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<Vec<LikeWithUser>>, ApiError> {
    let likes = state
        .social
        .get_likes_by_track(track_id)
        .await
        .map_err(social_error)?;
    Ok(Json(likes))
}

/// GET /api/likes/{track_id}/status (auth required)
pub async fn like_status(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<LikeStatus>, ApiError> {
    let is_liked = state
        .social
        .is_liked(auth_user.id(), track_id)
        .await
        .map_err(social_error)?;
    Ok(Json(LikeStatus { is_liked }))
}

/// GET /api/likes/{track_id}/count
pub async fn like_count(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<LikeCount>, ApiError> {
    let count = state.social.get_like_count(track_id).await.map_err(social_error)?;
    Ok(Json(LikeCount { count }))
}

/// GET /api/users/{id}/likes
pub async fn list_user_likes(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<LikeWithTrack>>, ApiError> {
    let likes = state
        .social
        .get_likes_by_user(user_id)
        .await
        .map_err(social_error)?;
    Ok(Json(likes))
}
