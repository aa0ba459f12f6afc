//! Review service.

use crate::services::{
    event_publisher::{
        EventPublisherService, Notification, NotificationKind, deliver_notification,
    },
    pagination::{Page, Pagination},
};
use chrono::Utc;
use humap_common::{AppError, AppResult, IdGenerator};
use humap_db::{
    entities::{review, user},
    repositories::{ActivityRepository, ReviewRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

/// Input for reviewing an activity.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub ranking: i32,
    #[validate(length(max = 2048))]
    pub comment: Option<String>,
}

/// Input for editing a review. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub ranking: Option<i32>,
    #[validate(length(max = 2048))]
    pub comment: Option<String>,
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    activity_repo: ActivityRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        activity_repo: ActivityRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            review_repo,
            activity_repo,
            user_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Review an activity and notify its owner.
    pub async fn create(
        &self,
        author: &user::Model,
        activity_id: &str,
        input: CreateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        let activity = self.activity_repo.get_by_id(activity_id).await?;

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            activity_id: Set(activity.id.clone()),
            user_id: Set(author.id.clone()),
            comment: Set(input.comment),
            ranking: Set(input.ranking),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.review_repo.create(model).await?;
        if let Err(e) = self.user_repo.increment_reviews_count(&author.id).await {
            tracing::warn!(error = %e, user_id = %author.id, "Failed to increment review count");
        }

        let owner_id = activity.user_id.as_deref().filter(|id| *id != author.id);
        if let Some(owner_id) = owner_id {
            let notification = Notification {
                kind: NotificationKind::Comment,
                activity_id: activity.id.clone(),
                activity_title: activity.title.clone(),
                actor_username: author.username.clone(),
                target_user_id: owner_id.to_string(),
                review_id: Some(created.id.clone()),
            };
            deliver_notification(self.event_publisher.as_ref(), notification).await;
        }

        Ok(created)
    }

    /// Get a review by ID.
    pub async fn get(&self, id: &str) -> AppResult<review::Model> {
        self.review_repo.get_by_id(id).await
    }

    /// Edit a review. Only its author or an admin may do so.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        let existing = self.get_editable(actor, id).await?;
        let mut active = existing.into_active_model();
        if let Some(ranking) = input.ranking {
            active.ranking = Set(ranking);
        }
        if input.comment.is_some() {
            active.comment = Set(input.comment);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.review_repo.update(active).await
    }

    /// Delete a review. Only its author or an admin may do so.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let existing = self.get_editable(actor, id).await?;
        self.review_repo.delete(&existing.id).await?;

        if let Err(e) = self.user_repo.decrement_reviews_count(&existing.user_id).await {
            tracing::warn!(
                error = %e,
                user_id = %existing.user_id,
                "Failed to decrement review count"
            );
        }
        tracing::info!(review_id = %existing.id, actor_id = %actor.id, "Deleted review");
        Ok(())
    }

    async fn get_editable(&self, actor: &user::Model, id: &str) -> AppResult<review::Model> {
        let review = self.review_repo.get_by_id(id).await?;
        if review.user_id != actor.id && !actor.is_admin() {
            return Err(AppError::access_denied());
        }
        Ok(review)
    }

    /// List the reviews of an activity, newest first.
    pub async fn list(
        &self,
        activity_id: &str,
        pagination: Pagination,
    ) -> AppResult<Page<review::Model>> {
        self.activity_repo.get_by_id(activity_id).await?;

        let total = self.review_repo.count_by_activity(activity_id).await?;
        let items = self
            .review_repo
            .find_by_activity(activity_id, pagination.offset(), pagination.limit())
            .await?;
        Ok(Page::new(pagination, total, items))
    }
}
