use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::{social_error, ApiError};
use crate::state::AppState;
use armed_core::search::{SearchParams, SearchProject, SearchResults, SearchTrack};
use armed_core::views::UserSummary;

/// GET /api/search?q=&limit= (auth required)
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let results = state
        .social
        .search(&params.q, params.limit)
        .await
        .map_err(social_error)?;
    Ok(Json(results))
}

/// GET /api/search/users?q=&limit= (auth required)
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state
        .social
        .search_users(&params.q, params.limit)
        .await
        .map_err(social_error)?;
    Ok(Json(users))
}

/// GET /api/search/tracks?q=&limit= (auth required)
pub async fn search_tracks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchTrack>>, ApiError> {
    let tracks = state
        .social
        .search_tracks(&params.q, params.limit)
        .await
        .map_err(social_error)?;
    Ok(Json(tracks))
}

/// GET /api/search/projects?q=&limit= (auth required)
pub async fn search_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchProject>>, ApiError> {
    let projects = state
        .social
        .search_projects(&params.q, params.limit)
        .await
        .map_err(social_error)?;
    Ok(Json(projects))
}
