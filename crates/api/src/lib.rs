//! HTTP API layer for humap.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: accounts, activities, reviews, likes and lists
//! - **Extractors**: authenticated user
//! - **Middleware**: bearer-token authentication
//! - **Streaming**: WebSocket hub with per-user rooms
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::limit::RequestBodyLimitLayer;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::{StreamingState, streaming_handler};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full application: API routes, streaming and authentication.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(router())
        .route("/streaming", get(streaming_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
