//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events.
//! The actual implementation is provided by the api crate (WebSocket hub).

use async_trait::async_trait;
use humap_common::AppResult;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Event names carried on the wire.
pub mod events {
    /// Someone liked one of the recipient's activities.
    pub const NOTIFICATION_LIKE: &str = "notification:like";
    /// Someone reviewed one of the recipient's activities.
    pub const NOTIFICATION_COMMENT: &str = "notification:comment";
    pub const ACTIVITY_CREATED: &str = "activity:created";
    pub const ACTIVITY_UPDATED: &str = "activity:updated";
    pub const ACTIVITY_DELETED: &str = "activity:deleted";
    /// Acknowledges a `join:user` request.
    pub const JOINED: &str = "joined";
    /// A client request was rejected.
    pub const ERROR: &str = "error";
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
}

/// A notification addressed to one user's room.
///
/// Never persisted; the serialized form is the wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub activity_id: String,
    pub activity_title: String,
    pub actor_username: String,
    pub target_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
}

impl Notification {
    /// Event name this notification is published under.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self.kind {
            NotificationKind::Like => events::NOTIFICATION_LIKE,
            NotificationKind::Comment => events::NOTIFICATION_COMMENT,
        }
    }
}

/// Trait for publishing real-time events.
///
/// This allows the core services to publish events
/// without directly depending on the transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to every connected client.
    async fn publish_broadcast(&self, event: &str, payload: Value) -> AppResult<()>;

    /// Publish an event to the clients that joined `user_id`'s room.
    ///
    /// Dropped silently when nobody joined.
    async fn publish_to_user(&self, user_id: &str, event: &str, payload: Value) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_broadcast(&self, _event: &str, _payload: Value) -> AppResult<()> {
        Ok(())
    }

    async fn publish_to_user(
        &self,
        _user_id: &str,
        _event: &str,
        _payload: Value,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Deliver a notification to its target. Failures are logged, never returned.
pub async fn deliver_notification(
    publisher: Option<&EventPublisherService>,
    notification: Notification,
) {
    let Some(publisher) = publisher else {
        return;
    };

    let event = notification.event_name();
    let target = notification.target_user_id.clone();
    let payload = match serde_json::to_value(&notification) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, event, "Failed to encode notification");
            return;
        }
    };

    if let Err(e) = publisher.publish_to_user(&target, event, payload).await {
        tracing::warn!(error = %e, event, user_id = %target, "Failed to publish notification");
    }
}

/// Broadcast an event to every client. Failures are logged, never returned.
pub async fn broadcast(publisher: Option<&EventPublisherService>, event: &str, payload: Value) {
    let Some(publisher) = publisher else {
        return;
    };

    if let Err(e) = publisher.publish_broadcast(event, payload).await {
        tracing::warn!(error = %e, event, "Failed to publish broadcast event");
    }
}
