//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use humap_common::AppResult;
use humap_core::{AuthSession, SigninInput, SignupInput};

use crate::{middleware::AppState, response::ApiResponse};

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.signup(input).await?;
    Ok(ApiResponse::created(session))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SigninInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.signin(input).await?;
    Ok(ApiResponse::ok(session))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}
