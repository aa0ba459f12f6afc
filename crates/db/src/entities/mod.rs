//! Database entities.

#![allow(missing_docs)]

pub mod activity;
pub mod list_entry;
pub mod review;
pub mod user;

pub use activity::Entity as Activity;
pub use list_entry::Entity as ListEntry;
pub use review::Entity as Review;
pub use user::Entity as User;
