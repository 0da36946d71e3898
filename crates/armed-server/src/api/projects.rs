use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use armed_core::content::{NewProject, NewTrack, ProjectChanges};
use armed_core::views::{ProjectResponse, TrackResponse};

/// POST /api/projects (auth required)
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Json(body): Json<NewProject>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let project = state
        .social
        .create_project(auth_user.id(), body)
        .await
        .map_err(social_error)?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// GET /api/projects (auth required): the caller's projects, newest first
pub async fn list_my_projects(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state
        .social
        .list_projects_by_user(auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state.social.get_project(project_id).await.map_err(social_error)?;
    Ok(Json(project.into()))
}

/// PUT /api/projects/{id} (auth required, owner only)
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ProjectChanges>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .social
        .update_project(project_id, auth_user.id(), body)
        .await
        .map_err(social_error)?;
    Ok(Json(project.into()))
}

/// DELETE /api/projects/{id} (auth required, owner only)
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .social
        .delete_project(project_id, auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{id}/tracks
pub async fn list_project_tracks(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<TrackResponse>>, ApiError> {
    let tracks = state
        .social
        .list_tracks_by_project(project_id)
        .await
        .map_err(social_error)?;
    Ok(Json(tracks.into_iter().map(TrackResponse::from).collect()))
}

/// POST /api/projects/{id}/tracks (auth required, owner only)
///
/// Registers an already stored audio file; the upload itself happens elsewhere.
pub async fn add_track(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<NewTrack>,
) -> Result<(StatusCode, Json<TrackResponse>), ApiError> {
    let track = state
        .social
        .create_track(project_id, auth_user.id(), body)
        .await
        .map_err(social_error)?;
    Ok((StatusCode::CREATED, Json(track.into())))
}
