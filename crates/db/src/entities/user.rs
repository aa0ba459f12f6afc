//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub username: String,

    /// Lowercased, unique.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Bearer token issued at signup.
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token: String,

    #[sea_orm(nullable)]
    pub avatar: Option<String>,

    #[sea_orm(nullable)]
    pub gender: Option<String>,

    pub role: Role,

    /// Reviews written (denormalized)
    #[sea_orm(default_value = 0)]
    pub nb_reviews: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
    #[sea_orm(has_many = "super::list_entry::Entity")]
    ListEntries,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl Related<super::list_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this account has elevated privileges on activities and reviews.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
