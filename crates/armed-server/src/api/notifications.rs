use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{social_error, ApiError};
use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use armed_core::notifications::NotificationPage;
use armed_core::PageRequest;
use armed_db::entities::notification;

/// `?limit=&offset=&unread_only=`. Not flattened over `PaginationParams`:
/// query strings only deserialize numbers into named fields.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /api/notifications (auth required)
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Query(params): Query<NotificationParams>,
) -> Result<Json<NotificationPage>, ApiError> {
    let page = PageRequest::new(params.limit, params.offset);
    let result = state
        .social
        .notifications()
        .get_by_user(auth_user.id(), page, params.unread_only)
        .await
        .map_err(social_error)?;
    Ok(Json(result))
}

/// GET /api/notifications/unread-count (auth required)
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
) -> Result<Json<UnreadCount>, ApiError> {
    let count = state
        .social
        .notifications()
        .get_unread_count(auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(Json(UnreadCount { count }))
}

/// PUT /api/notifications/{id}/read (auth required)
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<notification::Model>, ApiError> {
    let updated = state
        .social
        .notifications()
        .mark_as_read(notification_id, auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(Json(updated))
}

/// PUT /api/notifications/read-all (auth required)
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
) -> Result<Json<MarkedRead>, ApiError> {
    let updated = state
        .social
        .notifications()
        .mark_all_as_read(auth_user.id())
        .await
        .map_err(social_error)?;
    Ok(Json(MarkedRead { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default_to_all_notifications() {
        let params: NotificationParams = serde_json::from_str("{}").unwrap();
        assert!(!params.unread_only);
        assert_eq!(PageRequest::new(params.limit, params.offset), PageRequest::default());
    }

    #[test]
    fn test_params_unread_only() {
        let params: NotificationParams =
            serde_json::from_str(r#"{"limit":5,"unread_only":true}"#).unwrap();
        assert!(params.unread_only);
        assert_eq!(params.limit, Some(5));
    }
}
