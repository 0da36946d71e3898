use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use armed_core::comments::{CommentView, NewComment};
use armed_db::entities::comment;

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentCount {
    pub count: u64,
}

/// POST /api/comments (auth required)
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Json(body): Json<NewComment>,
) -> Result<(StatusCode, Json<comment::Model>), ApiError> {
    let created = state
        .social
        .create_comment(auth_user.id(), body.track_id, &body.content)
        .await
        .map_err(social_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/comments/{id}
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<CommentView>, ApiError> {
    let view = state
        .social
        .get_comment_by_id(comment_id)
        .await
        .map_err(social_error)?;
    Ok(Json(view))
}

/// PUT /api/comments/{id} (auth required, author only)
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(comment_id): Path<Uuid>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<comment::Model>, ApiError> {
    let updated = state
        .social
        .update_comment(comment_id, auth_user.id(), &body.content)
        .await
        .map_err(social_error)?;
    Ok(Json(updated))
}

/// DELETE /api/comments/{id} (auth required, author only)
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .social
        .delete_comment(comment_id, auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/comments/track/{track_id}
pub async fn list_track_comments(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = state
        .social
        .get_comments_by_track(track_id)
        .await
        .map_err(social_error)?;
    Ok(Json(comments))
}

/// GET /api/comments/track/{track_id}/count
pub async fn track_comment_count(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<CommentCount>, ApiError> {
    let count = state
        .social
        .get_comment_count(track_id)
        .await
        .map_err(social_error)?;
    Ok(Json(CommentCount { count }))
}
