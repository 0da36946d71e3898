use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::auth::routes::UserResponse;
use crate::state::AppState;
use armed_core::profile::{Profile, ProfileChanges};

/// GET /api/users/{id} (auth optional)
///
/// Anonymous callers get the public profile; `is_following` is then false.
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthUser>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    let viewer_id = viewer.map(|Extension(user)| user.id());
    let profile = state
        .social
        .get_profile(user_id, viewer_id)
        .await
        .map_err(social_error)?;
    Ok(Json(profile))
}

/// PUT /api/users/me (auth required)
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ProfileChanges>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .social
        .update_profile(auth_user.id(), body)
        .await
        .map_err(social_error)?;
    Ok(Json(updated.into()))
}
