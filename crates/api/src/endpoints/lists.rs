//! List endpoints: create, read, rename and delete the caller's list entries.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get},
};
use humap_common::AppResult;
use humap_core::{ListEntry, ListMembership};
use humap_db::entities::list_entry::ListKind;
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Create entry request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub kind: ListKind,
    pub activity_id: Option<String>,
    pub custom_name: Option<String>,
}

/// Attach activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachActivityRequest {
    pub activity_id: String,
}

/// Rename list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameListRequest {
    pub custom_name: String,
}

/// Get all of the caller's entries.
async fn list_all(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ListEntry>>> {
    let entries = state.list_entry_service.list_all(&user.id).await?;
    Ok(ApiResponse::ok(entries))
}

/// Create an entry, or return the identical existing one.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> AppResult<ApiResponse<ListEntry>> {
    let membership = ListMembership::new(req.kind, req.activity_id, req.custom_name)?;
    let write = state
        .list_entry_service
        .create_entry(&user.id, membership)
        .await?;
    Ok(ApiResponse::created_if(write.created, write.entry))
}

/// Get one entry.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> AppResult<ApiResponse<ListEntry>> {
    let entry = state
        .list_entry_service
        .get_entry(&user.id, &list_id)
        .await?;
    Ok(ApiResponse::ok(entry))
}

/// Add an activity to a custom list.
async fn attach(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(req): Json<AttachActivityRequest>,
) -> AppResult<ApiResponse<ListEntry>> {
    let write = state
        .list_entry_service
        .attach_activity(&user.id, &list_id, &req.activity_id)
        .await?;
    Ok(ApiResponse::created_if(write.created, write.entry))
}

/// Rename a custom list entry.
async fn rename(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(req): Json<RenameListRequest>,
) -> AppResult<ApiResponse<ListEntry>> {
    let entry = state
        .list_entry_service
        .rename_custom_list(&user.id, &list_id, &req.custom_name)
        .await?;
    Ok(ApiResponse::ok(entry))
}

/// Delete an entry.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .list_entry_service
        .delete_entry(&user.id, &list_id)
        .await?;
    Ok(no_content())
}

/// Remove an activity from a list.
async fn remove_activity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((list_id, activity_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    state
        .list_entry_service
        .remove_activity(&user.id, &list_id, &activity_id)
        .await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all).post(create))
        .route(
            "/{list_id}",
            get(show).post(attach).patch(rename).delete(remove),
        )
        .route(
            "/{list_id}/activities/{activity_id}",
            delete(remove_activity),
        )
}
