//! Activity repository.

use std::sync::Arc;

use crate::entities::{Activity, activity};
use humap_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

/// Activity repository for database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an activity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an activity by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<activity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity: {id}")))
    }

    /// Find every activity whose ID is in `ids`. Missing IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<activity::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Activity::find()
            .filter(activity::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn recent_query(mood: Option<&str>) -> Select<Activity> {
        let mut query = Activity::find();
        if let Some(mood) = mood {
            query = query.filter(activity::Column::Mood.eq(mood));
        }
        query
    }

    /// Get activities, newest first (offset paginated).
    pub async fn find_recent(
        &self,
        mood: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<activity::Model>> {
        Self::recent_query(mood)
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count activities matching the same filter as [`Self::find_recent`].
    pub async fn count_recent(&self, mood: Option<&str>) -> AppResult<u64> {
        Self::recent_query(mood)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new activity.
    pub async fn create(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an activity.
    pub async fn update(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an activity. List entries referencing it are left in place.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Activity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
