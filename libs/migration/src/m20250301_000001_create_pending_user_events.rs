use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingUserEvents::Table)
                    .if_not_exists()
                    .col(big_integer(PendingUserEvents::Id).auto_increment().primary_key())
                    .col(string(PendingUserEvents::Title))
                    .col(string(PendingUserEvents::Email))
                    .col(timestamp_with_time_zone(PendingUserEvents::CreatedAt).default(Expr::current_timestamp()))
                    .col(integer(PendingUserEvents::RetryCount).default(0))
                    .col(boolean(PendingUserEvents::Processed).default(false))
                    .to_owned(),
            )
            .await?;

        // The sweeper filters on processed, the purge on created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_user_events_processed")
                    .table(PendingUserEvents::Table)
                    .col(PendingUserEvents::Processed)
                    .col(PendingUserEvents::RetryCount)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pending_user_events_created_at")
                    .table(PendingUserEvents::Table)
                    .col(PendingUserEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingUserEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PendingUserEvents {
    Table,
    Id,
    Title,
    Email,
    CreatedAt,
    RetryCount,
    Processed,
}
