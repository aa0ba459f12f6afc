//! List entry entity.
//!
//! One table holds all three list kinds. A row links a user to an activity
//! under a kind; custom rows also carry the list name. Rows are never
//! cascaded from `activity`: orphans are filtered out at read time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which of a user's lists an entry belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[sea_orm(string_value = "history")]
    History,
    #[sea_orm(string_value = "liked")]
    Liked,
    #[sea_orm(string_value = "custom")]
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "list_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub kind: ListKind,

    /// NULL only for a bare custom list.
    #[sea_orm(nullable)]
    pub activity_id: Option<String>,

    /// Custom list name; empty string for history and liked rows so the
    /// unique index on (user_id, kind, list_name, activity_id) covers them too.
    pub list_name: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
