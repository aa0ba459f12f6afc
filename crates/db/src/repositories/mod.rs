//! Repository layer for database operations.

mod activity;
mod list_entry;
mod review;
mod user;

pub use activity::ActivityRepository;
pub use list_entry::ListEntryRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
