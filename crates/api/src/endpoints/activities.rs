//! Activities endpoints, including likes and reviews.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use humap_common::AppResult;
use humap_core::{
    CreateActivityInput, CreateReviewInput, LikeState, Page, Pagination, UpdateActivityInput,
};
use humap_db::entities::{activity, review};
use serde::{Deserialize, Serialize};

use super::PageQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Activity response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub mood: Option<String>,
    pub nb_people: Option<i32>,
    pub price_range: Option<i32>,
    pub age_range: Option<String>,
    pub day: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<activity::Model> for ActivityResponse {
    fn from(a: activity::Model) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            title: a.title,
            description: a.description,
            location: a.location,
            longitude: a.longitude,
            latitude: a.latitude,
            mood: a.mood,
            nb_people: a.nb_people,
            price_range: a.price_range,
            age_range: a.age_range,
            day: a.day,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Review response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub activity_id: String,
    pub user_id: String,
    pub comment: Option<String>,
    pub ranking: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<review::Model> for ReviewResponse {
    fn from(r: review::Model) -> Self {
        Self {
            id: r.id,
            activity_id: r.activity_id,
            user_id: r.user_id,
            comment: r.comment,
            ranking: r.ranking,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List activities query.
#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub mood: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Create an activity.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(activity.into()))
}

/// List activities, newest first.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListActivitiesQuery>,
) -> AppResult<ApiResponse<Page<ActivityResponse>>> {
    let page = state
        .activity_service
        .list(query.mood.as_deref(), Pagination::new(query.page, query.limit))
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Get an activity.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.get(&id).await?;
    Ok(ApiResponse::ok(activity.into()))
}

/// Update an activity.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(activity.into()))
}

/// Delete an activity.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.activity_service.delete(&user, &id).await?;
    Ok(no_content())
}

/// Toggle the caller's like.
async fn toggle_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let liked = state.like_service.toggle_like(&user.id, &id).await?;
    Ok(ApiResponse::ok(liked))
}

/// Get whether the caller likes the activity.
async fn like_state(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let liked = state.like_service.is_liked(&user.id, &id).await?;
    Ok(ApiResponse::ok(liked))
}

/// Remove the caller's like.
async fn remove_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.like_service.remove_like(&user.id, &id).await?;
    Ok(no_content())
}

/// Review an activity.
async fn create_review(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    let review = state.review_service.create(&user, &id, input).await?;
    Ok(ApiResponse::created(review.into()))
}

/// List an activity's reviews.
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<ReviewResponse>>> {
    let page = state
        .review_service
        .list(&id, query.pagination())
        .await?;
    Ok(ApiResponse::ok(page.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route(
            "/{id}/like",
            get(like_state).post(toggle_like).delete(remove_like),
        )
        .route("/{id}/reviews", get(list_reviews).post(create_review))
}
