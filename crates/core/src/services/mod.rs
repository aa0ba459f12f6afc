//! Business logic services.

#![allow(missing_docs)]

pub mod activity;
pub mod event_publisher;
pub mod like;
pub mod list_entry;
pub mod pagination;
pub mod review;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{ActivityService, CreateActivityInput, UpdateActivityInput};
pub use event_publisher::{
    EventPublisher, EventPublisherService, NoOpEventPublisher, Notification, NotificationKind,
    events,
};
pub use like::{LikeService, LikeState};
pub use list_entry::{
    ActivitySummary, ListEntry, ListEntryService, ListEntryWrite, ListItem, ListMembership,
    ListPage,
};
pub use pagination::{Page, Pagination};
pub use review::{CreateReviewInput, ReviewService, UpdateReviewInput};
pub use user::{AuthSession, SigninInput, SignupInput, UpdateUserInput, UserService};
