//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use humap_core::{ActivityService, LikeService, ListEntryService, ReviewService, UserService};

use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub activity_service: ActivityService,
    pub review_service: ReviewService,
    pub list_entry_service: ListEntryService,
    pub like_service: LikeService,
    pub streaming: StreamingState,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unknown tokens leave the request anonymous; handlers
/// that need a user reject it through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
