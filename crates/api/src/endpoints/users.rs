//! Users endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use humap_common::AppResult;
use humap_core::UpdateUserInput;
use humap_db::entities::user::{self, Role};
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Public user profile. Never carries the password hash or token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub role: Role,
    pub nb_reviews: i32,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar: user.avatar,
            gender: user.gender,
            role: user.role,
            nb_reviews: user.nb_reviews,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Get a user by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's own profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete the caller's own account.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.user_service.delete(&user, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(show).patch(update).delete(delete))
}
