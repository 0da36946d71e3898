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
use armed_core::follows::FollowEdge;
use armed_db::entities::follow;

#[derive(Debug, Serialize)]
pub struct FollowStatus {
    pub is_following: bool,
}

/// POST /api/follows/{user_id} (auth required)
pub async fn follow_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<follow::Model>), ApiError> {
    let edge = state
        .social
        .follow(auth_user.id(), user_id)
        .await
        .map_err(social_error)?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// DELETE /api/follows/{user_id} (auth required)
pub async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .social
        .unfollow(auth_user.id(), user_id)
        .await
        .map_err(social_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/follows/{user_id}/status (auth required)
pub async fn follow_status(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowStatus>, ApiError> {
    let is_following = state
        .social
        .is_following(auth_user.id(), user_id)
        .await
        .map_err(social_error)?;
    Ok(Json(FollowStatus { is_following }))
}

/// GET /api/follows/{user_id}/followers
pub async fn list_followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FollowEdge>>, ApiError> {
    let edges = state.social.get_followers(user_id).await.map_err(social_error)?;
    Ok(Json(edges))
}

/// GET /api/follows/{user_id}/following
pub async fn list_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FollowEdge>>, ApiError> {
    let edges = state.social.get_following(user_id).await.map_err(social_error)?;
    Ok(Json(edges))
}
