//! Create activity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).string_len(32))
                    .col(ColumnDef::new(Activity::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Activity::Description).text())
                    .col(ColumnDef::new(Activity::Location).string_len(512).not_null())
                    .col(ColumnDef::new(Activity::Longitude).double())
                    .col(ColumnDef::new(Activity::Latitude).double())
                    .col(ColumnDef::new(Activity::Mood).string_len(64))
                    .col(ColumnDef::new(Activity::NbPeople).integer())
                    .col(ColumnDef::new(Activity::PriceRange).integer())
                    .col(ColumnDef::new(Activity::AgeRange).string_len(64))
                    .col(ColumnDef::new(Activity::Day).string_len(32))
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Activity::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_user")
                            .from(Activity::Table, Activity::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's activities)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_user_id")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_created_at")
                    .table(Activity::Table)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Location,
    Longitude,
    Latitude,
    Mood,
    NbPeople,
    PriceRange,
    AgeRange,
    Day,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
