//! Activity service.

use crate::services::{
    event_publisher::{EventPublisherService, broadcast, events},
    pagination::{Page, Pagination},
};
use chrono::Utc;
use humap_common::{AppError, AppResult, IdGenerator};
use humap_db::{
    entities::{activity, user},
    repositories::ActivityRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Input for creating an activity.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub location: String,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(length(max = 64))]
    pub mood: Option<String>,
    #[validate(range(min = 1))]
    pub nb_people: Option<i32>,
    #[validate(range(min = 0))]
    pub price_range: Option<i32>,
    #[validate(length(max = 64))]
    pub age_range: Option<String>,
    #[validate(length(max = 32))]
    pub day: Option<String>,
}

/// Input for updating an activity. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub location: Option<String>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(length(max = 64))]
    pub mood: Option<String>,
    #[validate(range(min = 1))]
    pub nb_people: Option<i32>,
    #[validate(range(min = 0))]
    pub price_range: Option<i32>,
    #[validate(length(max = 64))]
    pub age_range: Option<String>,
    #[validate(length(max = 32))]
    pub day: Option<String>,
}

/// Activity service for business logic.
#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(activity_repo: ActivityRepository) -> Self {
        Self {
            activity_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create an activity owned by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateActivityInput,
    ) -> AppResult<activity::Model> {
        input.validate()?;

        let model = activity::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(Some(user_id.to_string())),
            title: Set(input.title),
            description: Set(input.description),
            location: Set(input.location),
            longitude: Set(input.longitude),
            latitude: Set(input.latitude),
            mood: Set(input.mood),
            nb_people: Set(input.nb_people),
            price_range: Set(input.price_range),
            age_range: Set(input.age_range),
            day: Set(input.day),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.activity_repo.create(model).await?;
        tracing::info!(activity_id = %created.id, user_id, "Created activity");

        self.broadcast_model(events::ACTIVITY_CREATED, &created).await;
        Ok(created)
    }

    /// Get an activity by ID.
    pub async fn get(&self, id: &str) -> AppResult<activity::Model> {
        self.activity_repo.get_by_id(id).await
    }

    /// List activities, newest first, optionally filtered by mood.
    pub async fn list(
        &self,
        mood: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<Page<activity::Model>> {
        let total = self.activity_repo.count_recent(mood).await?;
        let items = self
            .activity_repo
            .find_recent(mood, pagination.offset(), pagination.limit())
            .await?;
        Ok(Page::new(pagination, total, items))
    }

    /// Update an activity. Only its author or an admin may do so.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateActivityInput,
    ) -> AppResult<activity::Model> {
        input.validate()?;

        let existing = self.get_editable(actor, id).await?;
        let mut active = existing.into_active_model();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if input.description.is_some() {
            active.description = Set(input.description);
        }
        if input.longitude.is_some() {
            active.longitude = Set(input.longitude);
        }
        if input.latitude.is_some() {
            active.latitude = Set(input.latitude);
        }
        if input.mood.is_some() {
            active.mood = Set(input.mood);
        }
        if input.nb_people.is_some() {
            active.nb_people = Set(input.nb_people);
        }
        if input.price_range.is_some() {
            active.price_range = Set(input.price_range);
        }
        if input.age_range.is_some() {
            active.age_range = Set(input.age_range);
        }
        if input.day.is_some() {
            active.day = Set(input.day);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.activity_repo.update(active).await?;
        self.broadcast_model(events::ACTIVITY_UPDATED, &updated).await;
        Ok(updated)
    }

    /// Delete an activity. Only its author or an admin may do so.
    ///
    /// List entries pointing at it are kept and skipped when lists are read.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let existing = self.get_editable(actor, id).await?;
        self.activity_repo.delete(&existing.id).await?;

        tracing::info!(activity_id = %existing.id, actor_id = %actor.id, "Deleted activity");
        broadcast(
            self.event_publisher.as_ref(),
            events::ACTIVITY_DELETED,
            json!({ "id": existing.id }),
        )
        .await;
        Ok(())
    }

    async fn get_editable(&self, actor: &user::Model, id: &str) -> AppResult<activity::Model> {
        let activity = self.activity_repo.get_by_id(id).await?;
        let is_author = activity.user_id.as_deref() == Some(actor.id.as_str());
        if !is_author && !actor.is_admin() {
            return Err(AppError::access_denied());
        }
        Ok(activity)
    }

    async fn broadcast_model(&self, event: &str, activity: &activity::Model) {
        match serde_json::to_value(activity) {
            Ok(payload) => broadcast(self.event_publisher.as_ref(), event, payload).await,
            Err(e) => tracing::warn!(error = %e, event, "Failed to encode activity event"),
        }
    }
}
