use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use super::validation;
use super::{ApiError, ApiResponse, AppState, BugPayload, BugsPayload};
use crate::db::{BugFilter, BugPatch};
use crate::services::{CreateBug, CurrentUser};

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters arrive as raw strings so non-numeric page/limit values
/// can be coerced to their defaults instead of rejected.
#[derive(Deserialize)]
pub struct BugListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBugRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<i32>,
    pub priority: Option<String>,
    pub assigned_to: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateBugRequest {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    /// Two-level option: absent leaves the assignee alone, an explicit
    /// null (or 0) unassigns.
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<i32>>,
}

/// Marks a field as present even when its value is null
fn present<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct DeleteBugRequest {
    pub id: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateBugStatusRequest {
    pub bug_id: Option<i32>,
    pub status: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /bugs
/// Filtered, paginated listing, newest first.
pub async fn list_bugs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BugListQuery>,
) -> Result<Json<ApiResponse<BugsPayload>>, ApiError> {
    let default_limit = state.config().read().await.pagination.bugs_per_page;

    let page = validation::coerce_page(query.page.as_deref());
    let limit = validation::coerce_limit(query.limit.as_deref(), default_limit);

    let filter = BugFilter {
        project_id: validation::parse_id_filter(query.project_id.as_deref()),
        status: validation::non_empty(query.status),
        priority: validation::non_empty(query.priority),
        assigned_to: validation::parse_id_filter(query.assigned_to.as_deref()),
    };

    let listing = state.bugs().list(filter, page, limit).await?;

    Ok(Json(ApiResponse::success(BugsPayload::from(listing))))
}

/// POST /bugs
pub async fn create_bug(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateBugRequest>,
) -> Result<Json<ApiResponse<BugPayload>>, ApiError> {
    let bug = CreateBug {
        title: payload.title.unwrap_or_default().trim().to_string(),
        description: payload.description.unwrap_or_default().trim().to_string(),
        project_id: payload.project_id.unwrap_or(0),
        priority: validation::non_empty(payload.priority),
        assigned_to: payload.assigned_to,
    };

    let created = state.bugs().create(&user, bug).await?;

    Ok(Json(ApiResponse::with_message(
        "Bug created successfully",
        BugPayload { bug: created },
    )))
}

/// PUT /bugs
/// Partial update; only the fields present in the body are written.
pub async fn update_bug(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateBugRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::require_id(payload.id, "Bug ID")?;

    let patch = BugPatch {
        title: validation::non_empty(payload.title),
        description: validation::non_empty(payload.description),
        priority: validation::non_empty(payload.priority),
        status: validation::non_empty(payload.status),
        assigned_to: payload
            .assigned_to
            .map(|assignee| assignee.filter(|id| *id > 0)),
    };

    state.bugs().update(&user, id, patch).await?;

    Ok(Json(ApiResponse::message("Bug updated successfully")))
}

/// DELETE /bugs
pub async fn delete_bug(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DeleteBugRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::require_id(payload.id, "Bug ID")?;

    state.bugs().delete(&user, id).await?;

    Ok(Json(ApiResponse::message("Bug deleted successfully")))
}

/// POST /bugs/status
/// Narrow mutation used by the Kanban board's drag-and-drop.
pub async fn update_bug_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateBugStatusRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let status = validation::non_empty(payload.status);

    let (Some(id), Some(status)) = (payload.bug_id.filter(|id| *id > 0), status) else {
        return Err(ApiError::validation("Bug ID and status are required"));
    };

    state.bugs().update_status(&user, id, &status).await?;

    Ok(Json(ApiResponse::message(
        "Bug status updated successfully",
    )))
}
