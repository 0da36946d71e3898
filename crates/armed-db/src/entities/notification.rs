use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    #[sea_orm(string_value = "LIKE")]
    Like,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "FOLLOW")]
    Follow,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "LIKE",
            NotificationType::Comment => "COMMENT",
            NotificationType::Follow => "FOLLOW",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification addressed to `user_id`, caused by `actor_id`.
///
/// `user_id != actor_id` always holds: self-notifications are suppressed
/// before insert and rejected by a CHECK constraint.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub actor_id: Uuid,
    /// Track concerned, absent for FOLLOW
    pub target_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
    #[sea_orm(
        belongs_to = "super::track::Entity",
        from = "Column::TargetId",
        to = "super::track::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Target.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_as_str() {
        assert_eq!(NotificationType::Like.as_str(), "LIKE");
        assert_eq!(NotificationType::Comment.as_str(), "COMMENT");
        assert_eq!(NotificationType::Follow.as_str(), "FOLLOW");
    }

    #[test]
    fn test_notification_type_display() {
        assert_eq!(format!("{}", NotificationType::Follow), "FOLLOW");
    }

    #[test]
    fn test_notification_type_serde_uppercase() {
        let json = serde_json::to_string(&NotificationType::Comment).unwrap();
        assert_eq!(json, r#""COMMENT""#);
        let kind: NotificationType = serde_json::from_str(r#""LIKE""#).unwrap();
        assert_eq!(kind, NotificationType::Like);
    }

    #[test]
    fn test_model_serializes_kind_as_type() {
        let model = Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: NotificationType::Follow,
            actor_id: Uuid::new_v4(),
            target_id: None,
            read: false,
            created_at: chrono::Utc::now().fixed_offset(),
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["type"], "FOLLOW");
        assert!(json.get("kind").is_none());
        assert!(json["target_id"].is_null());
    }
}
