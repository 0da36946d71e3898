//! Notification engine.
//!
//! A notification goes `unread -> read` and never back. Creation is invoked
//! as a best-effort side effect of follow/like/comment through
//! [`Notifier::dispatch`], which reports failures to the [`EventSink`] and
//! never returns them.

use armed_db::entities::notification::{self, NotificationType};
use armed_db::entities::{project, track, user};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::content::{find_tracks_by_ids, find_users_by_ids};
use crate::error::{SocialError, SocialResult};
use crate::events::{EventSink, NotificationEvent, UnresolvedReason};
use crate::pagination::PageRequest;
use crate::views::{TrackSummary, UserSummary};

/// The primary action a notification is a side effect of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Like { actor_id: Uuid, track_id: Uuid },
    Comment { actor_id: Uuid, track_id: Uuid },
    Follow { actor_id: Uuid, following_id: Uuid },
}

impl Trigger {
    pub fn kind(&self) -> NotificationType {
        match self {
            Trigger::Like { .. } => NotificationType::Like,
            Trigger::Comment { .. } => NotificationType::Comment,
            Trigger::Follow { .. } => NotificationType::Follow,
        }
    }

    pub fn actor_id(&self) -> Uuid {
        match *self {
            Trigger::Like { actor_id, .. }
            | Trigger::Comment { actor_id, .. }
            | Trigger::Follow { actor_id, .. } => actor_id,
        }
    }

    fn track_id(&self) -> Option<Uuid> {
        match *self {
            Trigger::Like { track_id, .. } | Trigger::Comment { track_id, .. } => Some(track_id),
            Trigger::Follow { .. } => None,
        }
    }

    fn recipient_id(&self) -> Option<Uuid> {
        match *self {
            Trigger::Follow { following_id, .. } => Some(following_id),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: notification::Model,
    pub actor: Option<UserSummary>,
    pub target: Option<TrackSummary>,
}

#[derive(Debug, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<NotificationView>,
    pub total: u64,
}

#[derive(Clone)]
pub struct Notifier {
    db: DatabaseConnection,
    sink: Arc<dyn EventSink>,
}

impl Notifier {
    pub fn new(db: DatabaseConnection, sink: Arc<dyn EventSink>) -> Self {
        Self { db, sink }
    }

    /// Run the notification side effect of `trigger`.
    ///
    /// Must only be called after the primary write has been persisted.
    /// Errors are reported as [`NotificationEvent::DeliveryFailed`] and dropped.
    pub async fn dispatch(&self, trigger: Trigger) {
        let result = match trigger {
            Trigger::Like { actor_id, track_id } => {
                self.create_like_notification(actor_id, track_id).await
            }
            Trigger::Comment { actor_id, track_id } => {
                self.create_comment_notification(actor_id, track_id).await
            }
            Trigger::Follow {
                actor_id,
                following_id,
            } => self.create_follow_notification(actor_id, following_id).await,
        };

        if let Err(e) = result {
            self.sink.emit(&NotificationEvent::DeliveryFailed {
                kind: trigger.kind(),
                actor_id: trigger.actor_id(),
                recipient_id: trigger.recipient_id(),
                target_id: trigger.track_id(),
                error: e.to_string(),
            });
        }
    }

    /// Store a notification for `recipient_id`.
    ///
    /// Returns `Ok(None)` without touching the store when the actor is the
    /// recipient: self-actions never notify.
    pub async fn create(
        &self,
        recipient_id: Uuid,
        kind: NotificationType,
        actor_id: Uuid,
        target_id: Option<Uuid>,
    ) -> SocialResult<Option<notification::Model>> {
        if recipient_id == actor_id {
            self.sink
                .emit(&NotificationEvent::SelfSuppressed { kind, actor_id });
            return Ok(None);
        }

        let entry = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(recipient_id),
            kind: Set(kind),
            actor_id: Set(actor_id),
            target_id: Set(target_id),
            read: Set(false),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };
        let saved = entry.insert(&self.db).await?;

        self.sink.emit(&NotificationEvent::Created {
            notification_id: saved.id,
            kind,
            recipient_id,
            actor_id,
            target_id,
        });
        Ok(Some(saved))
    }

    pub async fn create_like_notification(
        &self,
        actor_id: Uuid,
        track_id: Uuid,
    ) -> SocialResult<Option<notification::Model>> {
        self.notify_track_owner(NotificationType::Like, actor_id, track_id)
            .await
    }

    pub async fn create_comment_notification(
        &self,
        actor_id: Uuid,
        track_id: Uuid,
    ) -> SocialResult<Option<notification::Model>> {
        self.notify_track_owner(NotificationType::Comment, actor_id, track_id)
            .await
    }

    pub async fn create_follow_notification(
        &self,
        actor_id: Uuid,
        following_id: Uuid,
    ) -> SocialResult<Option<notification::Model>> {
        self.create(following_id, NotificationType::Follow, actor_id, None)
            .await
    }

    /// The recipient is whoever owns the track's project right now.
    async fn notify_track_owner(
        &self,
        kind: NotificationType,
        actor_id: Uuid,
        track_id: Uuid,
    ) -> SocialResult<Option<notification::Model>> {
        match self.resolve_track_owner(track_id).await? {
            Ok(owner_id) => self.create(owner_id, kind, actor_id, Some(track_id)).await,
            Err(reason) => {
                self.sink.emit(&NotificationEvent::RecipientUnresolved {
                    kind,
                    actor_id,
                    track_id,
                    reason,
                });
                Ok(None)
            }
        }
    }

    /// Walk track -> project -> owner.
    async fn resolve_track_owner(
        &self,
        track_id: Uuid,
    ) -> SocialResult<Result<Uuid, UnresolvedReason>> {
        let Some(track) = track::Entity::find_by_id(track_id).one(&self.db).await? else {
            return Ok(Err(UnresolvedReason::TrackMissing));
        };
        let Some(project) = project::Entity::find_by_id(track.project_id)
            .one(&self.db)
            .await?
        else {
            return Ok(Err(UnresolvedReason::ProjectMissing));
        };
        let owner = user::Entity::find_by_id(project.user_id)
            .one(&self.db)
            .await?;
        Ok(owner.map(|u| u.id).ok_or(UnresolvedReason::OwnerMissing))
    }

    /// Newest first, with actor identity and target track attached.
    pub async fn get_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
        unread_only: bool,
    ) -> SocialResult<NotificationPage> {
        let mut query = notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::Read.eq(false));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await?;

        let actor_ids: Vec<Uuid> = rows.iter().map(|n| n.actor_id).collect();
        let target_ids: Vec<Uuid> = rows.iter().filter_map(|n| n.target_id).collect();
        let (actors, targets) = tokio::try_join!(
            find_users_by_ids(&self.db, &actor_ids),
            find_tracks_by_ids(&self.db, &target_ids),
        )?;

        let notifications = rows
            .into_iter()
            .map(|n| NotificationView {
                actor: actors.get(&n.actor_id).map(UserSummary::from),
                target: n
                    .target_id
                    .and_then(|id| targets.get(&id))
                    .map(TrackSummary::from),
                notification: n,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            %user_id,
            count = notifications.len(),
            total,
            unread_only,
            "notifications listed"
        );

        Ok(NotificationPage {
            notifications,
            total,
        })
    }

    /// Mark one of `user_id`'s notifications as read.
    pub async fn mark_as_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> SocialResult<notification::Model> {
        let existing = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| SocialError::NotFound("Notification not found".into()))?;

        if existing.read {
            return Ok(existing);
        }

        let mut update: notification::ActiveModel = existing.into();
        update.read = Set(true);
        Ok(update.update(&self.db).await?)
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> SocialResult<u64> {
        let res = notification::Entity::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn get_unread_count(&self, user_id: Uuid) -> SocialResult<u64> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .count(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_accessors() {
        let actor = Uuid::new_v4();
        let track = Uuid::new_v4();
        let like = Trigger::Like {
            actor_id: actor,
            track_id: track,
        };
        assert_eq!(like.kind(), NotificationType::Like);
        assert_eq!(like.actor_id(), actor);
        assert_eq!(like.track_id(), Some(track));
        assert_eq!(like.recipient_id(), None);

        let followed = Uuid::new_v4();
        let follow = Trigger::Follow {
            actor_id: actor,
            following_id: followed,
        };
        assert_eq!(follow.kind(), NotificationType::Follow);
        assert_eq!(follow.track_id(), None);
        assert_eq!(follow.recipient_id(), Some(followed));
    }

    #[test]
    fn test_notification_view_flattens_model() {
        let view = NotificationView {
            notification: notification::Model {
                id: Uuid::nil(),
                user_id: Uuid::nil(),
                kind: NotificationType::Comment,
                actor_id: Uuid::nil(),
                target_id: None,
                read: false,
                created_at: chrono::Utc::now().fixed_offset(),
            },
            actor: None,
            target: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "COMMENT");
        assert_eq!(json["read"], false);
        assert!(json["actor"].is_null());
        assert!(json.get("notification").is_none());
    }
}
