use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_projects::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tracks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tracks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tracks::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Tracks::FileName).string_len(255).not_null())
                    .col(ColumnDef::new(Tracks::FilePath).string_len(1024).not_null())
                    .col(ColumnDef::new(Tracks::DurationSecs).float().null())
                    .col(ColumnDef::new(Tracks::FileSize).big_integer().null())
                    .col(ColumnDef::new(Tracks::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(Tracks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracks_project_id")
                            .from(Tracks::Table, Tracks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Feed step 4: tracks of a project set, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_tracks_project_id_created_at")
                    .table(Tracks::Table)
                    .col(Tracks::ProjectId)
                    .col(Tracks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tracks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tracks {
    Table,
    Id,
    Name,
    FileName,
    FilePath,
    DurationSecs,
    FileSize,
    ProjectId,
    CreatedAt,
}
