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
use armed_core::views::TrackResponse;

#[derive(Debug, Serialize)]
pub struct TrackDetail {
    #[serde(flatten)]
    pub track: TrackResponse,
    pub like_count: u64,
    pub comment_count: u64,
}

/// GET /api/tracks/{id}
pub async fn get_track(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<Uuid>,
) -> Result<Json<TrackDetail>, ApiError> {
    let track = state.social.get_track(track_id).await.map_err(social_error)?;
    let (like_count, comment_count) = tokio::try_join!(
        state.social.get_like_count(track_id),
        state.social.get_comment_count(track_id),
    )
    .map_err(social_error)?;

    Ok(Json(TrackDetail {
        track: track.into(),
        like_count,
        comment_count,
    }))
}

/// DELETE /api/tracks/{id} (auth required, project owner only)
pub async fn delete_track(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(track_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .social
        .delete_track(track_id, auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(StatusCode::NO_CONTENT)
}
