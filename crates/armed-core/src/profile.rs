//! Public user profiles with aggregated stats.

use armed_db::entities::{project, track, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::comments::comment_counts_by_track;
use crate::content::{find_projects_by_owner_ids, find_user_by_id};
use crate::error::{SocialError, SocialResult};
use crate::follows::{count_followers, count_following};
use crate::likes::like_counts_by_track;
use crate::views::{ProjectResponse, TrackResponse};
use crate::Social;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUser {
    pub id: Uuid,
    /// Only present on the viewer's own profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub followers: u64,
    pub following: u64,
    pub tracks: u64,
    /// Likes received on this user's tracks.
    pub likes: u64,
    /// Comments received on this user's tracks.
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileProject {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub tracks_count: u64,
    pub likes_count: u64,
    pub comments_count: u64,
    pub tracks: Vec<TrackResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: ProfileUser,
    pub stats: ProfileStats,
    pub projects: Vec<ProfileProject>,
    pub is_following: bool,
    pub is_own_profile: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl Social {
    /// Profile of `user_id` as seen by `viewer_id` (anonymous when `None`).
    pub async fn get_profile(&self, user_id: Uuid, viewer_id: Option<Uuid>) -> SocialResult<Profile> {
        let user = find_user_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("User not found".into()))?;

        let projects = find_projects_by_owner_ids(&self.db, &[user_id]).await?;
        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let tracks = if project_ids.is_empty() {
            Vec::new()
        } else {
            track::Entity::find()
                .filter(track::Column::ProjectId.is_in(project_ids))
                .order_by_desc(track::Column::CreatedAt)
                .all(&self.db)
                .await?
        };
        let track_ids: Vec<Uuid> = tracks.iter().map(|t| t.id).collect();

        let (followers, following, likes, comments) = tokio::try_join!(
            count_followers(&self.db, user_id),
            count_following(&self.db, user_id),
            like_counts_by_track(&self.db, &track_ids),
            comment_counts_by_track(&self.db, &track_ids),
        )?;

        let is_own_profile = viewer_id == Some(user_id);
        let is_following = match viewer_id {
            Some(viewer) if viewer != user_id => self.is_following(viewer, user_id).await?,
            _ => false,
        };

        let stats = ProfileStats {
            followers,
            following,
            tracks: tracks.len() as u64,
            likes: likes.values().sum(),
            comments: comments.values().sum(),
        };

        Ok(Profile {
            user: profile_user(user, is_own_profile),
            stats,
            projects: group_projects(projects, tracks, &likes, &comments),
            is_following,
            is_own_profile,
        })
    }

    /// Apply `changes` to the caller's own profile. Blank strings clear
    /// optional fields; a blank username is rejected.
    pub async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> SocialResult<user::Model> {
        let existing = find_user_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("User not found".into()))?;

        let mut update: user::ActiveModel = existing.into();

        if let Some(username) = changes.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(SocialError::InvalidInput("Username cannot be empty".into()));
            }
            let taken = user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .filter(user::Column::Id.ne(user_id))
                .one(&self.db)
                .await?
                .is_some();
            if taken {
                return Err(SocialError::Conflict("Username already taken".into()));
            }
            update.username = Set(Some(username.to_string()));
        }
        if let Some(name) = changes.name {
            update.name = Set(non_blank(name));
        }
        if let Some(avatar_url) = changes.avatar_url {
            update.avatar_url = Set(non_blank(avatar_url));
        }
        if let Some(bio) = changes.bio {
            update.bio = Set(non_blank(bio));
        }
        update.updated_at = Set(chrono::Utc::now().fixed_offset());

        let updated = update
            .update(&self.db)
            .await
            .map_err(|e| SocialError::from_write(e, "Username already taken", "User not found"))?;
        tracing::info!(%user_id, "profile updated");
        Ok(updated)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn profile_user(u: user::Model, own: bool) -> ProfileUser {
    ProfileUser {
        id: u.id,
        display_name: u.display_label().to_string(),
        email: own.then_some(u.email),
        username: u.username,
        name: u.name,
        avatar_url: u.avatar_url,
        bio: u.bio,
        created_at: u.created_at,
    }
}

/// Group tracks (newest first) under their projects and roll up counts.
fn group_projects(
    projects: Vec<project::Model>,
    tracks: Vec<track::Model>,
    likes: &HashMap<Uuid, u64>,
    comments: &HashMap<Uuid, u64>,
) -> Vec<ProfileProject> {
    let mut by_project: HashMap<Uuid, Vec<track::Model>> = HashMap::new();
    for t in tracks {
        by_project.entry(t.project_id).or_default().push(t);
    }

    projects
        .into_iter()
        .map(|p| {
            let tracks = by_project.remove(&p.id).unwrap_or_default();
            let likes_count = tracks.iter().filter_map(|t| likes.get(&t.id)).sum();
            let comments_count = tracks.iter().filter_map(|t| comments.get(&t.id)).sum();
            ProfileProject {
                project: ProjectResponse::from(p),
                tracks_count: tracks.len() as u64,
                likes_count,
                comments_count,
                tracks: tracks.into_iter().map(TrackResponse::from).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fixtures;

    #[test]
    fn test_group_projects_rolls_up_counts() {
        let ana = fixtures::user("ana");
        let demos = fixtures::project(ana.id, "Demos");
        let empty = fixtures::project(ana.id, "Empty");
        let t1 = fixtures::track(demos.id, "one", 20);
        let t2 = fixtures::track(demos.id, "two", 10);
        let likes: HashMap<Uuid, u64> = [(t1.id, 2), (t2.id, 1)].into();
        let comments: HashMap<Uuid, u64> = [(t2.id, 5)].into();

        let out = group_projects(
            vec![demos.clone(), empty.clone()],
            vec![t1.clone(), t2],
            &likes,
            &comments,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].project.id, demos.id);
        assert_eq!(out[0].tracks_count, 2);
        assert_eq!(out[0].likes_count, 3);
        assert_eq!(out[0].comments_count, 5);
        assert_eq!(out[0].tracks[0].id, t1.id);
        assert_eq!(out[1].project.id, empty.id);
        assert_eq!(out[1].tracks_count, 0);
        assert!(out[1].tracks.is_empty());
    }

    #[test]
    fn test_profile_user_hides_email_from_others() {
        let ana = fixtures::user("ana");
        let json = serde_json::to_value(profile_user(ana.clone(), false)).unwrap();
        assert!(json.get("email").is_none());

        let json = serde_json::to_value(profile_user(ana, true)).unwrap();
        assert_eq!(json["email"], "ana@example.com");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  bass player ".into()).as_deref(), Some("bass player"));
        assert_eq!(non_blank("   ".into()), None);
    }
}
