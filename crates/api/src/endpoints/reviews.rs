//! Review endpoints addressed by review ID.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use humap_common::AppResult;
use humap_core::UpdateReviewInput;

use super::ReviewResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Get a review.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    let review = state.review_service.get(&id).await?;
    Ok(ApiResponse::ok(review.into()))
}

/// Edit a review.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateReviewInput>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    let review = state.review_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(review.into()))
}

/// Delete a review.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.review_service.delete(&user, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(show).put(update).delete(delete))
}
