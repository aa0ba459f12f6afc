//! Create list_entry table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to activity: deleting an activity leaves its entries.
        manager
            .create_table(
                Table::create()
                    .table(ListEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ListEntry::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ListEntry::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(ListEntry::ActivityId).string_len(32))
                    .col(
                        ColumnDef::new(ListEntry::ListName)
                            .string_len(128)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ListEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ListEntry::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_entry_user")
                            .from(ListEntry::Table, ListEntry::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, kind, created_at) for list queries
        manager
            .create_index(
                Index::create()
                    .name("idx_list_entry_user_kind")
                    .table(ListEntry::Table)
                    .col(ListEntry::UserId)
                    .col(ListEntry::Kind)
                    .col(ListEntry::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Unique index: one row per (user, kind, list name, activity).
        // Covers liked/history (list_name = '') and named custom lists alike.
        manager
            .create_index(
                Index::create()
                    .name("idx_list_entry_unique_membership")
                    .table(ListEntry::Table)
                    .col(ListEntry::UserId)
                    .col(ListEntry::Kind)
                    .col(ListEntry::ListName)
                    .col(ListEntry::ActivityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: activity_id (for is-liked lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_list_entry_activity_id")
                    .table(ListEntry::Table)
                    .col(ListEntry::ActivityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ListEntry {
    Table,
    Id,
    UserId,
    Kind,
    ActivityId,
    ListName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
