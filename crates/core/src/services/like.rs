//! Like service.
//!
//! Likes are list entries of kind `liked`. A user has at most one per
//! activity; the unique index on list entries is the final arbiter when two
//! toggles race.

use crate::services::event_publisher::{
    EventPublisherService, Notification, NotificationKind, deliver_notification,
};
use chrono::Utc;
use humap_common::{AppError, AppResult, IdGenerator};
use humap_db::{
    entities::{
        activity,
        list_entry::{self, ListKind},
    },
    repositories::{ActivityRepository, ListEntryRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Whether the caller likes an activity after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    list_repo: ListEntryRepository,
    activity_repo: ActivityRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        list_repo: ListEntryRepository,
        activity_repo: ActivityRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            list_repo,
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

    /// Like the activity if the caller doesn't yet, unlike it otherwise.
    ///
    /// Only the unliked to liked transition notifies the activity owner, and
    /// never when the owner is the caller.
    pub async fn toggle_like(&self, user_id: &str, activity_id: &str) -> AppResult<LikeState> {
        let activity = self.activity_repo.get_by_id(activity_id).await?;

        if let Some(existing) = self.list_repo.find_liked(user_id, activity_id).await? {
            self.list_repo.delete_by_id(&existing.id).await?;
            tracing::debug!(user_id, activity_id, "Unliked activity");
            return Ok(LikeState { liked: false });
        }

        let model = list_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            kind: Set(ListKind::Liked),
            activity_id: Set(Some(activity_id.to_string())),
            list_name: Set(String::new()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.list_repo.create(model).await {
            Ok(_) => {}
            // A concurrent toggle inserted first; it owns the notification.
            Err(AppError::Conflict(_)) => return Ok(LikeState { liked: true }),
            Err(e) => return Err(e),
        }

        tracing::debug!(user_id, activity_id, "Liked activity");
        self.notify_owner(user_id, &activity).await;

        Ok(LikeState { liked: true })
    }

    /// Remove the caller's like.
    pub async fn remove_like(&self, user_id: &str, activity_id: &str) -> AppResult<()> {
        let existing = self
            .list_repo
            .find_liked(user_id, activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Like on activity {activity_id}")))?;

        self.list_repo.delete_by_id(&existing.id).await
    }

    /// Check whether the caller likes an activity.
    pub async fn is_liked(&self, user_id: &str, activity_id: &str) -> AppResult<LikeState> {
        let liked = self
            .list_repo
            .find_liked(user_id, activity_id)
            .await?
            .is_some();
        Ok(LikeState { liked })
    }

    async fn notify_owner(&self, actor_id: &str, activity: &activity::Model) {
        let Some(owner_id) = activity.user_id.as_deref() else {
            return;
        };
        if owner_id == actor_id || self.event_publisher.is_none() {
            return;
        }

        let actor_username = match self.user_repo.find_by_id(actor_id).await {
            Ok(Some(actor)) => actor.username,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, actor_id, "Failed to load like notification actor");
                return;
            }
        };

        let notification = Notification {
            kind: NotificationKind::Like,
            activity_id: activity.id.clone(),
            activity_title: activity.title.clone(),
            actor_username,
            target_user_id: owner_id.to_string(),
            review_id: None,
        };
        deliver_notification(self.event_publisher.as_ref(), notification).await;
    }
}
