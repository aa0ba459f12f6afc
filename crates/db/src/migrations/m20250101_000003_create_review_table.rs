//! Create review table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Review::ActivityId).string_len(32).not_null())
                    .col(ColumnDef::new(Review::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Review::Comment).text())
                    .col(ColumnDef::new(Review::Ranking).integer().not_null())
                    .col(
                        ColumnDef::new(Review::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Review::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_activity")
                            .from(Review::Table, Review::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_user")
                            .from(Review::Table, Review::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (activity_id, created_at) for listing an activity's reviews
        manager
            .create_index(
                Index::create()
                    .name("idx_review_activity_created_at")
                    .table(Review::Table)
                    .col(Review::ActivityId)
                    .col(Review::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
    ActivityId,
    UserId,
    Comment,
    Ranking,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
