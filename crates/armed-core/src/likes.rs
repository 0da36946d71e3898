//! Likes: at most one per (user, track).

use armed_db::entities::like;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::content::{find_track_by_id, find_tracks_by_ids, find_users_by_ids};
use crate::error::{SocialError, SocialResult};
use crate::notifications::Trigger;
use crate::views::{TrackSummary, UserSummary};
use crate::Social;

/// Row of a `GROUP BY track_id` count.
#[derive(Debug, FromQueryResult)]
pub(crate) struct TrackCount {
    pub track_id: Uuid,
    pub count: i64,
}

pub(crate) fn into_count_map(rows: Vec<TrackCount>) -> HashMap<Uuid, u64> {
    rows.into_iter()
        .map(|r| (r.track_id, u64::try_from(r.count).unwrap_or(0)))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeWithUser {
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeWithTrack {
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub track: TrackSummary,
}

impl Social {
    /// Like a track and notify the owner of its project.
    pub async fn like(&self, user_id: Uuid, track_id: Uuid) -> SocialResult<like::Model> {
        if find_track_by_id(&self.db, track_id).await?.is_none() {
            return Err(SocialError::NotFound("Track not found".into()));
        }

        if self.is_liked(user_id, track_id).await? {
            return Err(SocialError::Conflict("Already liked this track".into()));
        }

        let entry = like::ActiveModel {
            user_id: Set(user_id),
            track_id: Set(track_id),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };
        let created = entry
            .insert(&self.db)
            .await
            .map_err(|e| SocialError::from_write(e, "Already liked this track", "User or track not found"))?;

        tracing::info!(%user_id, %track_id, "track liked");

        self.notifier
            .dispatch(Trigger::Like {
                actor_id: user_id,
                track_id,
            })
            .await;

        Ok(created)
    }

    pub async fn unlike(&self, user_id: Uuid, track_id: Uuid) -> SocialResult<()> {
        let res = like::Entity::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TrackId.eq(track_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(SocialError::NotFound("Like not found".into()));
        }

        tracing::info!(%user_id, %track_id, "track unliked");
        Ok(())
    }

    pub async fn is_liked(&self, user_id: Uuid, track_id: Uuid) -> SocialResult<bool> {
        let count = like::Entity::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TrackId.eq(track_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Likes on a track with the liker attached, newest first.
    pub async fn get_likes_by_track(&self, track_id: Uuid) -> SocialResult<Vec<LikeWithUser>> {
        let likes = like::Entity::find()
            .filter(like::Column::TrackId.eq(track_id))
            .order_by_desc(like::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let user_ids: Vec<Uuid> = likes.iter().map(|l| l.user_id).collect();
        let users = find_users_by_ids(&self.db, &user_ids).await?;

        Ok(likes
            .into_iter()
            .filter_map(|l| {
                let user = users.get(&l.user_id)?;
                Some(LikeWithUser {
                    user_id: l.user_id,
                    track_id: l.track_id,
                    created_at: l.created_at,
                    user: UserSummary::from(user),
                })
            })
            .collect())
    }

    /// Tracks a user liked, newest like first.
    pub async fn get_likes_by_user(&self, user_id: Uuid) -> SocialResult<Vec<LikeWithTrack>> {
        let likes = like::Entity::find()
            .filter(like::Column::UserId.eq(user_id))
            .order_by_desc(like::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let track_ids: Vec<Uuid> = likes.iter().map(|l| l.track_id).collect();
        let tracks = find_tracks_by_ids(&self.db, &track_ids).await?;

        Ok(likes
            .into_iter()
            .filter_map(|l| {
                let track = tracks.get(&l.track_id)?;
                Some(LikeWithTrack {
                    user_id: l.user_id,
                    track_id: l.track_id,
                    created_at: l.created_at,
                    track: TrackSummary::from(track),
                })
            })
            .collect())
    }

    pub async fn get_like_count(&self, track_id: Uuid) -> SocialResult<u64> {
        Ok(like::Entity::find()
            .filter(like::Column::TrackId.eq(track_id))
            .count(&self.db)
            .await?)
    }
}

/// Like count per track in one grouped query. Tracks without likes are absent.
pub(crate) async fn like_counts_by_track(
    db: &DatabaseConnection,
    track_ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, u64>> {
    if track_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = like::Entity::find()
        .select_only()
        .column(like::Column::TrackId)
        .column_as(like::Column::UserId.count(), "count")
        .filter(like::Column::TrackId.is_in(track_ids.to_vec()))
        .group_by(like::Column::TrackId)
        .into_model::<TrackCount>()
        .all(db)
        .await?;
    Ok(into_count_map(rows))
}

/// Which of `track_ids` the viewer has liked.
pub(crate) async fn liked_track_ids(
    db: &DatabaseConnection,
    viewer_id: Uuid,
    track_ids: &[Uuid],
) -> SocialResult<HashSet<Uuid>> {
    if track_ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(like::Entity::find()
        .filter(like::Column::UserId.eq(viewer_id))
        .filter(like::Column::TrackId.is_in(track_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.track_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_count_map() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let map = into_count_map(vec![
            TrackCount { track_id: a, count: 3 },
            TrackCount { track_id: b, count: -1 },
        ]);
        assert_eq!(map[&a], 3);
        assert_eq!(map[&b], 0);
        assert_eq!(map.get(&Uuid::nil()), None);
    }

    #[tokio::test]
    async fn test_batch_reads_short_circuit_on_empty_input() {
        let db = DatabaseConnection::Disconnected;
        assert!(like_counts_by_track(&db, &[]).await.unwrap().is_empty());
        assert!(liked_track_ids(&db, Uuid::nil(), &[]).await.unwrap().is_empty());
    }
}
