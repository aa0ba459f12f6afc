//! Endpoints scoped to the caller: profile and list pages.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use humap_common::AppResult;
use humap_core::ListPage;
use humap_db::entities::list_entry::ListKind;
use serde::Deserialize;

use super::{PageQuery, UserResponse};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Custom list page query.
#[derive(Debug, Deserialize)]
pub struct CustomListQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Get the caller's profile.
async fn show(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

async fn query_list(
    state: &AppState,
    user_id: &str,
    kind: ListKind,
    name: Option<&str>,
    query: &PageQuery,
) -> AppResult<ApiResponse<ListPage>> {
    let page = state
        .list_entry_service
        .query_list(user_id, kind, name, query.pagination())
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Get a page of the caller's history.
async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<ListPage>> {
    query_list(&state, &user.id, ListKind::History, None, &query).await
}

/// Get a page of the activities the caller liked.
async fn liked(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<ListPage>> {
    query_list(&state, &user.id, ListKind::Liked, None, &query).await
}

/// Get a page of one of the caller's custom lists (`?name=`).
async fn custom(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CustomListQuery>,
) -> AppResult<ApiResponse<ListPage>> {
    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    query_list(
        &state,
        &user.id,
        ListKind::Custom,
        query.name.as_deref(),
        &page_query,
    )
    .await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/activities/history", get(history))
        .route("/activities/liked", get(liked))
        .route("/activities/custom", get(custom))
}
