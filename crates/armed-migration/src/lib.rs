pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_projects;
mod m20250101_000003_create_tracks;
mod m20250101_000004_create_follows;
mod m20250101_000005_create_likes;
mod m20250101_000006_create_comments;
mod m20250101_000007_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_projects::Migration),
            Box::new(m20250101_000003_create_tracks::Migration),
            Box::new(m20250101_000004_create_follows::Migration),
            Box::new(m20250101_000005_create_likes::Migration),
            Box::new(m20250101_000006_create_comments::Migration),
            Box::new(m20250101_000007_create_notifications::Migration),
        ]
    }
}
