//! User repository.

use std::sync::Arc;

use crate::{
    entities::{User, user},
    map_write_err,
};
use humap_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User: {id}")))
    }

    /// Find a user by email (already lowercased by the caller).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user. A taken email surfaces as [`AppError::Conflict`].
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a user. A taken email surfaces as [`AppError::Conflict`].
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Delete a user. Their reviews and list entries go with them.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the review counter atomically (single UPDATE query, no fetch).
    pub async fn increment_reviews_count(&self, user_id: &str) -> AppResult<()> {
        self.add_to_reviews_count(user_id, 1).await
    }

    /// Decrement the review counter atomically, never below zero.
    pub async fn decrement_reviews_count(&self, user_id: &str) -> AppResult<()> {
        self.add_to_reviews_count(user_id, -1).await
    }

    async fn add_to_reviews_count(&self, user_id: &str, delta: i32) -> AppResult<()> {
        let mut update = User::update_many()
            .col_expr(
                user::Column::NbReviews,
                Expr::col(user::Column::NbReviews).add(delta),
            )
            .filter(user::Column::Id.eq(user_id));
        if delta < 0 {
            update = update.filter(user::Column::NbReviews.gte(-delta));
        }

        update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
