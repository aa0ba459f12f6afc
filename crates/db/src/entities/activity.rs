//! Activity entity (a location-tagged event posted by a user).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author. NULL for imported activities.
    #[sea_orm(indexed, nullable)]
    pub user_id: Option<String>,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub location: String,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub mood: Option<String>,

    #[sea_orm(nullable)]
    pub nb_people: Option<i32>,

    #[sea_orm(nullable)]
    pub price_range: Option<i32>,

    #[sea_orm(nullable)]
    pub age_range: Option<String>,

    #[sea_orm(nullable)]
    pub day: Option<String>,

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
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
