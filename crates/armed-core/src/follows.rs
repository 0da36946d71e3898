//! Social graph: directed follow edges.

use armed_db::entities::{follow, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::content::{find_user_by_id, find_users_by_ids};
use crate::error::{SocialError, SocialResult};
use crate::notifications::Trigger;
use crate::views::UserSummary;
use crate::Social;

/// A follow edge with the other party's identity resolved.
#[derive(Debug, Clone, Serialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub user: UserSummary,
}

/// Which side of the edge the listed user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Followers,
    Following,
}

impl Social {
    /// Create the edge `follower_id -> following_id` and notify the followed user.
    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<follow::Model> {
        if follower_id == following_id {
            return Err(SocialError::InvalidOperation("Cannot follow yourself".into()));
        }

        if find_user_by_id(&self.db, following_id).await?.is_none() {
            return Err(SocialError::NotFound("User to follow not found".into()));
        }

        if self.is_following(follower_id, following_id).await? {
            return Err(SocialError::Conflict("Already following this user".into()));
        }

        let edge = follow::ActiveModel {
            follower_id: Set(follower_id),
            following_id: Set(following_id),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };
        let created = edge.insert(&self.db).await.map_err(|e| {
            SocialError::from_write(e, "Already following this user", "User not found")
        })?;

        tracing::info!(%follower_id, %following_id, "user followed");

        self.notifier
            .dispatch(Trigger::Follow {
                actor_id: follower_id,
                following_id,
            })
            .await;

        Ok(created)
    }

    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<()> {
        let res = follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(SocialError::NotFound("Follow relationship not found".into()));
        }

        tracing::info!(%follower_id, %following_id, "user unfollowed");
        Ok(())
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<bool> {
        let count = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Users following `user_id`, newest edge first.
    pub async fn get_followers(&self, user_id: Uuid) -> SocialResult<Vec<FollowEdge>> {
        list_edges(&self.db, user_id, Side::Followers).await
    }

    /// Users `user_id` follows, newest edge first.
    pub async fn get_following(&self, user_id: Uuid) -> SocialResult<Vec<FollowEdge>> {
        list_edges(&self.db, user_id, Side::Following).await
    }
}

/// Ids of everyone `user_id` follows.
pub(crate) async fn following_ids(db: &DatabaseConnection, user_id: Uuid) -> SocialResult<Vec<Uuid>> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.following_id)
        .collect())
}

pub(crate) async fn count_followers(db: &DatabaseConnection, user_id: Uuid) -> SocialResult<u64> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FollowingId.eq(user_id))
        .count(db)
        .await?)
}

pub(crate) async fn count_following(db: &DatabaseConnection, user_id: Uuid) -> SocialResult<u64> {
    Ok(follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .count(db)
        .await?)
}

async fn list_edges(
    db: &DatabaseConnection,
    user_id: Uuid,
    side: Side,
) -> SocialResult<Vec<FollowEdge>> {
    let filter = match side {
        Side::Followers => follow::Column::FollowingId.eq(user_id),
        Side::Following => follow::Column::FollowerId.eq(user_id),
    };
    let edges = follow::Entity::find()
        .filter(filter)
        .order_by_desc(follow::Column::CreatedAt)
        .all(db)
        .await?;

    let other_ids: Vec<Uuid> = edges.iter().map(|e| other_party(e, side)).collect();
    let users = find_users_by_ids(db, &other_ids).await?;

    Ok(attach_users(edges, side, &users))
}

fn other_party(edge: &follow::Model, side: Side) -> Uuid {
    match side {
        Side::Followers => edge.follower_id,
        Side::Following => edge.following_id,
    }
}

/// Edges whose other party no longer resolves are left out.
fn attach_users(
    edges: Vec<follow::Model>,
    side: Side,
    users: &HashMap<Uuid, user::Model>,
) -> Vec<FollowEdge> {
    edges
        .into_iter()
        .filter_map(|e| {
            let user = users.get(&other_party(&e, side))?;
            Some(FollowEdge {
                follower_id: e.follower_id,
                following_id: e.following_id,
                created_at: e.created_at,
                user: UserSummary::from(user),
            })
        })
        .collect()
}
