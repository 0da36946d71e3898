//! Content and identity resolution (users, projects, tracks) plus the plain
//! project/track CRUD the rest of the app relies on.

use armed_db::entities::{project, track, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{SocialError, SocialResult};
use crate::pagination::PageRequest;
use crate::Social;

/// Sort order for track listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Deduplicate ids, keeping first-seen order.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// ─── Resolution ─────────────────────────────────────────────────────

pub async fn find_user_by_id(db: &DatabaseConnection, id: Uuid) -> SocialResult<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

/// Batch user lookup. Ids with no row are simply absent from the map.
pub async fn find_users_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, user::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(unique_ids(ids.iter().copied())))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

pub async fn find_track_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> SocialResult<Option<track::Model>> {
    Ok(track::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_tracks_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, track::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(track::Entity::find()
        .filter(track::Column::Id.is_in(unique_ids(ids.iter().copied())))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect())
}

pub async fn find_project_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> SocialResult<Option<project::Model>> {
    Ok(project::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_projects_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, project::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(project::Entity::find()
        .filter(project::Column::Id.is_in(unique_ids(ids.iter().copied())))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

pub async fn find_projects_by_owner_ids(
    db: &DatabaseConnection,
    owner_ids: &[Uuid],
) -> SocialResult<Vec<project::Model>> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(project::Entity::find()
        .filter(project::Column::UserId.is_in(unique_ids(owner_ids.iter().copied())))
        .order_by_desc(project::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn find_tracks_by_project_ids(
    db: &DatabaseConnection,
    project_ids: &[Uuid],
    order: TrackOrder,
    page: PageRequest,
) -> SocialResult<Vec<track::Model>> {
    if project_ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = track::Entity::find().filter(track::Column::ProjectId.is_in(project_ids.to_vec()));
    let query = match order {
        TrackOrder::NewestFirst => query
            .order_by_desc(track::Column::CreatedAt)
            .order_by_desc(track::Column::Id),
        TrackOrder::OldestFirst => query
            .order_by_asc(track::Column::CreatedAt)
            .order_by_asc(track::Column::Id),
    };
    Ok(query
        .limit(page.limit)
        .offset(page.offset)
        .all(db)
        .await?)
}

pub async fn count_tracks_by_project_ids(
    db: &DatabaseConnection,
    project_ids: &[Uuid],
) -> SocialResult<u64> {
    if project_ids.is_empty() {
        return Ok(0);
    }
    Ok(track::Entity::find()
        .filter(track::Column::ProjectId.is_in(project_ids.to_vec()))
        .count(db)
        .await?)
}

// ─── Project / track CRUD ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub daw_type: Option<String>,
    pub daw_project_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub daw_type: Option<String>,
    pub daw_project_path: Option<String>,
}

/// Metadata of an already stored audio file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrack {
    pub name: String,
    pub file_name: String,
    pub file_path: String,
    pub duration_secs: Option<f32>,
    pub file_size: Option<i64>,
}

fn required_name(name: &str, what: &str) -> SocialResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SocialError::InvalidInput(format!("{what} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

impl Social {
    pub async fn create_project(&self, owner_id: Uuid, new: NewProject) -> SocialResult<project::Model> {
        let name = required_name(&new.name, "Project")?;

        let entry = project::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(new.description),
            daw_type: Set(new.daw_type),
            daw_project_path: Set(new.daw_project_path),
            user_id: Set(owner_id),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };

        let created = entry
            .insert(&self.db)
            .await
            .map_err(|e| SocialError::from_write(e, "Project already exists", "User not found"))?;
        tracing::info!(project_id = %created.id, owner_id = %owner_id, "project created");
        Ok(created)
    }

    pub async fn list_projects_by_user(&self, user_id: Uuid) -> SocialResult<Vec<project::Model>> {
        find_projects_by_owner_ids(&self.db, &[user_id]).await
    }

    pub async fn get_project(&self, id: Uuid) -> SocialResult<project::Model> {
        find_project_by_id(&self.db, id)
            .await?
            .ok_or_else(|| SocialError::NotFound("Project not found".into()))
    }

    async fn owned_project(&self, id: Uuid, caller_id: Uuid) -> SocialResult<project::Model> {
        let project = self.get_project(id).await?;
        if project.user_id != caller_id {
            return Err(SocialError::Forbidden(
                "You can only modify your own projects".into(),
            ));
        }
        Ok(project)
    }

    pub async fn update_project(
        &self,
        id: Uuid,
        caller_id: Uuid,
        changes: ProjectChanges,
    ) -> SocialResult<project::Model> {
        let existing = self.owned_project(id, caller_id).await?;

        let mut update: project::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            update.name = Set(required_name(&name, "Project")?);
        }
        if let Some(description) = changes.description {
            update.description = Set(Some(description));
        }
        if let Some(daw_type) = changes.daw_type {
            update.daw_type = Set(Some(daw_type));
        }
        if let Some(path) = changes.daw_project_path {
            update.daw_project_path = Set(Some(path));
        }

        Ok(update.update(&self.db).await?)
    }

    /// Delete a project and, explicitly, its tracks. Likes, comments and
    /// notifications on those tracks go with them through the foreign keys.
    pub async fn delete_project(&self, id: Uuid, caller_id: Uuid) -> SocialResult<()> {
        let project = self.owned_project(id, caller_id).await?;

        let txn = self.db.begin().await?;
        let removed = track::Entity::delete_many()
            .filter(track::Column::ProjectId.eq(project.id))
            .exec(&txn)
            .await?;
        project::Entity::delete_by_id(project.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            project_id = %id,
            tracks_removed = removed.rows_affected,
            "project deleted"
        );
        Ok(())
    }

    pub async fn create_track(
        &self,
        project_id: Uuid,
        caller_id: Uuid,
        new: NewTrack,
    ) -> SocialResult<track::Model> {
        let project = self.owned_project(project_id, caller_id).await?;
        let name = required_name(&new.name, "Track")?;

        let entry = track::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            file_name: Set(new.file_name),
            file_path: Set(new.file_path),
            duration_secs: Set(new.duration_secs),
            file_size: Set(new.file_size),
            project_id: Set(project.id),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };

        let created = entry
            .insert(&self.db)
            .await
            .map_err(|e| SocialError::from_write(e, "Track already exists", "Project not found"))?;
        tracing::info!(track_id = %created.id, project_id = %project.id, "track created");
        Ok(created)
    }

    pub async fn list_tracks_by_project(&self, project_id: Uuid) -> SocialResult<Vec<track::Model>> {
        self.get_project(project_id).await?;
        Ok(track::Entity::find()
            .filter(track::Column::ProjectId.eq(project_id))
            .order_by_desc(track::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn get_track(&self, id: Uuid) -> SocialResult<track::Model> {
        find_track_by_id(&self.db, id)
            .await?
            .ok_or_else(|| SocialError::NotFound("Track not found".into()))
    }

    pub async fn delete_track(&self, id: Uuid, caller_id: Uuid) -> SocialResult<()> {
        let track = self.get_track(id).await?;
        let project = find_project_by_id(&self.db, track.project_id).await?;
        if project.map(|p| p.user_id) != Some(caller_id) {
            return Err(SocialError::Forbidden(
                "You can only delete tracks from your own projects".into(),
            ));
        }

        track::Entity::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(track_id = %id, "track deleted");
        Ok(())
    }
}
