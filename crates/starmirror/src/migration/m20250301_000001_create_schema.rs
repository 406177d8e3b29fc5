//! Initial migration to create the starmirror database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_starred_repositories(manager).await?;
        self.create_sync_runs(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StarredRepositories::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_starred_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StarredRepositories::Table)
                    .if_not_exists()
                    // Internal
                    .col(
                        ColumnDef::new(StarredRepositories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(
                        ColumnDef::new(StarredRepositories::FullName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StarredRepositories::Name).string().not_null())
                    // Content
                    .col(
                        ColumnDef::new(StarredRepositories::Description)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(StarredRepositories::Language).string().null())
                    .col(
                        ColumnDef::new(StarredRepositories::OwnerName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::OwnerAvatarUrl)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(StarredRepositories::HtmlUrl).text().null())
                    .col(ColumnDef::new(StarredRepositories::Homepage).text().null())
                    .col(
                        ColumnDef::new(StarredRepositories::Topics)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::LicenseName)
                            .string()
                            .null(),
                    )
                    // Statistics
                    .col(
                        ColumnDef::new(StarredRepositories::StarsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::ForksCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::WatchersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::OpenIssuesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    // Flags
                    .col(
                        ColumnDef::new(StarredRepositories::IsFork)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Remote timestamps
                    .col(
                        ColumnDef::new(StarredRepositories::RepoCreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::RepoUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::RepoPushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::StarredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Tracking
                    .col(
                        ColumnDef::new(StarredRepositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(StarredRepositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One record per full name
        manager
            .create_index(
                Index::create()
                    .name("idx_starred_repos_full_name")
                    .table(StarredRepositories::Table)
                    .col(StarredRepositories::FullName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_starred_repos_language")
                    .table(StarredRepositories::Table)
                    .col(StarredRepositories::Language)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_starred_repos_starred_at")
                    .table(StarredRepositories::Table)
                    .col((StarredRepositories::StarredAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_runs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncRuns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SyncRuns::Kind).string().not_null())
                    .col(ColumnDef::new(SyncRuns::Status).string().not_null())
                    .col(
                        ColumnDef::new(SyncRuns::TotalCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::SyncedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::DeletedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SyncRuns::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(SyncRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // History pages are ordered by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_runs_created_at")
                    .table(SyncRuns::Table)
                    .col((SyncRuns::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Latest successful run lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_runs_status_finished")
                    .table(SyncRuns::Table)
                    .col(SyncRuns::Status)
                    .col(SyncRuns::FinishedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "starred_repositories")]
enum StarredRepositories {
    Table,
    Id,
    FullName,
    Name,
    Description,
    Language,
    OwnerName,
    OwnerAvatarUrl,
    HtmlUrl,
    Homepage,
    Topics,
    LicenseName,
    StarsCount,
    ForksCount,
    WatchersCount,
    OpenIssuesCount,
    IsFork,
    IsArchived,
    RepoCreatedAt,
    RepoUpdatedAt,
    RepoPushedAt,
    StarredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_runs")]
enum SyncRuns {
    Table,
    Id,
    Kind,
    Status,
    TotalCount,
    SyncedCount,
    DeletedCount,
    StartedAt,
    FinishedAt,
    ErrorMessage,
    CreatedAt,
}
