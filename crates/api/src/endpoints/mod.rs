//! API endpoints.

#![allow(missing_docs)]

mod activities;
mod auth;
mod lists;
mod me;
mod reviews;
mod users;

use axum::Router;
use humap_core::Pagination;
use serde::Deserialize;

use crate::middleware::AppState;

pub use activities::{ActivityResponse, ReviewResponse};
pub use users::UserResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/activities", activities::router())
        .nest("/reviews", reviews::router())
        .nest("/lists", lists::router())
        .nest("/me", me::router())
}

/// `?page=&limit=` query parameters, clamped on use.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}
