//! Review repository.

use std::sync::Arc;

use crate::entities::{Review, review};
use humap_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a review by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<review::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review: {id}")))
    }

    /// Get reviews of an activity, newest first (offset paginated).
    pub async fn find_by_activity(
        &self,
        activity_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::ActivityId.eq(activity_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reviews on an activity.
    pub async fn count_by_activity(&self, activity_id: &str) -> AppResult<u64> {
        Review::find()
            .filter(review::Column::ActivityId.eq(activity_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new review.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a review.
    pub async fn update(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a review.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Review::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_review(id: &str, activity_id: &str, ranking: i32) -> review::Model {
        review::Model {
            id: id.to_string(),
            activity_id: activity_id.to_string(),
            user_id: "alice".to_string(),
            comment: Some("Great".to_string()),
            ranking,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_activity() {
        let r1 = create_test_review("r2", "a1", 5);
        let r2 = create_test_review("r1", "a1", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.find_by_activity("a1", 0, 10).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "r2");
    }

    #[tokio::test]
    async fn test_count_by_activity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.count_by_activity("a1").await.unwrap();

        assert_eq!(result, 2);
    }
}
