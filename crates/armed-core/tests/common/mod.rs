// Shared test utilities for integration tests
#![allow(dead_code)]

use armed_core::{MemorySink, Social};
use armed_db::entities::notification::{self, NotificationType};
use armed_db::entities::{project, track, user};
use armed_migration::{Migrator, MigratorTrait};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub social: Social,
    pub sink: Arc<MemorySink>,
    pub db: DatabaseConnection,
}

/// Fresh migrated in-memory database. A single connection, since every
/// SQLite memory connection is its own database.
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn test_app() -> TestApp {
    let db = test_db().await;
    let sink = Arc::new(MemorySink::new());
    let social = Social::new(db.clone(), sink.clone());
    TestApp { social, sink, db }
}

/// Whole seconds past a fixed epoch, so ordering never depends on the clock.
pub fn at(secs: i64) -> DateTime<FixedOffset> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .expect("valid timestamp")
        .fixed_offset()
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{username}@example.com")),
        username: Set(Some(username.to_string())),
        password_hash: Set("not-a-real-hash".into()),
        name: Set(None),
        avatar_url: Set(None),
        bio: Set(None),
        created_at: Set(at(0)),
        updated_at: Set(at(0)),
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_project(db: &DatabaseConnection, owner_id: Uuid, name: &str) -> project::Model {
    project::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        daw_type: Set(Some("ableton".into())),
        daw_project_path: Set(None),
        user_id: Set(owner_id),
        created_at: Set(at(0)),
    }
    .insert(db)
    .await
    .expect("insert project")
}

pub async fn create_track(
    db: &DatabaseConnection,
    project_id: Uuid,
    name: &str,
    secs: i64,
) -> track::Model {
    track::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        file_name: Set(format!("{name}.wav")),
        file_path: Set(format!("/uploads/{name}.wav")),
        duration_secs: Set(Some(120.0)),
        file_size: Set(Some(2_048)),
        project_id: Set(project_id),
        created_at: Set(at(secs)),
    }
    .insert(db)
    .await
    .expect("insert track")
}

/// Insert a notification directly with a fixed timestamp.
pub async fn create_notification(
    db: &DatabaseConnection,
    recipient_id: Uuid,
    kind: NotificationType,
    actor_id: Uuid,
    target_id: Option<Uuid>,
    secs: i64,
) -> notification::Model {
    notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(recipient_id),
        kind: Set(kind),
        actor_id: Set(actor_id),
        target_id: Set(target_id),
        read: Set(false),
        created_at: Set(at(secs)),
    }
    .insert(db)
    .await
    .expect("insert notification")
}

/// A user with one project holding one track.
pub async fn artist_with_track(
    db: &DatabaseConnection,
    username: &str,
) -> (user::Model, project::Model, track::Model) {
    let owner = create_user(db, username).await;
    let project = create_project(db, owner.id, &format!("{username} demos")).await;
    let track = create_track(db, project.id, &format!("{username}-first"), 0).await;
    (owner, project, track)
}
