//! Public shapes of users, projects and tracks embedded in core responses.

use armed_db::entities::{project, track, user};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

/// Public identity of a user. Never carries email or credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&user::Model> for UserSummary {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            name: u.name.clone(),
            display_name: u.display_label().to_string(),
            avatar_url: u.avatar_url.clone(),
        }
    }
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self::from(&u)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub duration_secs: Option<f32>,
}

impl From<&track::Model> for TrackSummary {
    fn from(t: &track::Model) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            project_id: t.project_id,
            duration_secs: t.duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResponse {
    pub id: Uuid,
    pub name: String,
    pub file_name: String,
    pub duration_secs: Option<f32>,
    pub file_size: Option<i64>,
    pub project_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
}

impl From<track::Model> for TrackResponse {
    fn from(t: track::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            file_name: t.file_name,
            duration_secs: t.duration_secs,
            file_size: t.file_size,
            project_id: t.project_id,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub daw_type: Option<String>,
    pub daw_project_path: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
}

impl From<project::Model> for ProjectResponse {
    fn from(p: project::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            daw_type: p.daw_type,
            daw_project_path: p.daw_project_path,
            user_id: p.user_id,
            created_at: p.created_at,
        }
    }
}
