//! Comments on tracks. Only the author may edit or delete.

use armed_db::entities::{comment, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::content::{find_track_by_id, find_user_by_id, find_users_by_ids};
use crate::error::{SocialError, SocialResult};
use crate::likes::{into_count_map, TrackCount};
use crate::notifications::Trigger;
use crate::views::{TrackSummary, UserSummary};
use crate::Social;

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub track_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackSummary>,
}

/// Trimmed content, or `InvalidInput` when nothing is left.
fn comment_content(raw: &str) -> SocialResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SocialError::InvalidInput(
            "Comment content cannot be empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}

impl Social {
    /// Comment on a track and notify the owner of its project.
    pub async fn create_comment(
        &self,
        user_id: Uuid,
        track_id: Uuid,
        content: &str,
    ) -> SocialResult<comment::Model> {
        if find_track_by_id(&self.db, track_id).await?.is_none() {
            return Err(SocialError::NotFound("Track not found".into()));
        }
        let content = comment_content(content)?;

        let now = chrono::Utc::now().fixed_offset();
        let entry = comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            track_id: Set(track_id),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = entry
            .insert(&self.db)
            .await
            .map_err(|e| SocialError::from_write(e, "Comment already exists", "User or track not found"))?;

        tracing::info!(comment_id = %created.id, %user_id, %track_id, "comment created");

        self.notifier
            .dispatch(Trigger::Comment {
                actor_id: user_id,
                track_id,
            })
            .await;

        Ok(created)
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> SocialResult<comment::Model> {
        let existing = self.find_comment(comment_id).await?;
        if existing.user_id != user_id {
            return Err(SocialError::Forbidden(
                "You can only edit your own comments".into(),
            ));
        }
        let content = comment_content(content)?;

        let mut update: comment::ActiveModel = existing.into();
        update.content = Set(content);
        update.updated_at = Set(chrono::Utc::now().fixed_offset());
        let updated = update.update(&self.db).await?;

        tracing::info!(%comment_id, "comment updated");
        Ok(updated)
    }

    pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> SocialResult<()> {
        let existing = self.find_comment(comment_id).await?;
        if existing.user_id != user_id {
            return Err(SocialError::Forbidden(
                "You can only delete your own comments".into(),
            ));
        }

        comment::Entity::delete_by_id(comment_id)
            .exec(&self.db)
            .await?;
        tracing::info!(%comment_id, "comment deleted");
        Ok(())
    }

    /// Newest first, each with its author.
    pub async fn get_comments_by_track(&self, track_id: Uuid) -> SocialResult<Vec<CommentView>> {
        let comments = comment::Entity::find()
            .filter(comment::Column::TrackId.eq(track_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;

        let user_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
        let users = find_users_by_ids(&self.db, &user_ids).await?;

        Ok(with_authors(comments, &users))
    }

    /// A single comment with its author and track.
    pub async fn get_comment_by_id(&self, comment_id: Uuid) -> SocialResult<CommentView> {
        let comment = self.find_comment(comment_id).await?;
        let (user, track) = tokio::try_join!(
            find_user_by_id(&self.db, comment.user_id),
            find_track_by_id(&self.db, comment.track_id),
        )?;

        Ok(CommentView {
            user: user.map(UserSummary::from),
            track: track.as_ref().map(TrackSummary::from),
            comment,
        })
    }

    pub async fn get_comment_count(&self, track_id: Uuid) -> SocialResult<u64> {
        Ok(comment::Entity::find()
            .filter(comment::Column::TrackId.eq(track_id))
            .count(&self.db)
            .await?)
    }

    async fn find_comment(&self, comment_id: Uuid) -> SocialResult<comment::Model> {
        comment::Entity::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SocialError::NotFound("Comment not found".into()))
    }
}

fn with_authors(
    comments: Vec<comment::Model>,
    users: &HashMap<Uuid, user::Model>,
) -> Vec<CommentView> {
    comments
        .into_iter()
        .map(|c| CommentView {
            user: users.get(&c.user_id).map(UserSummary::from),
            track: None,
            comment: c,
        })
        .collect()
}

/// Comment count per track in one grouped query. Tracks without comments are absent.
pub(crate) async fn comment_counts_by_track(
    db: &DatabaseConnection,
    track_ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, u64>> {
    if track_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = comment::Entity::find()
        .select_only()
        .column(comment::Column::TrackId)
        .column_as(comment::Column::Id.count(), "count")
        .filter(comment::Column::TrackId.is_in(track_ids.to_vec()))
        .group_by(comment::Column::TrackId)
        .into_model::<TrackCount>()
        .all(db)
        .await?;
    Ok(into_count_map(rows))
}
