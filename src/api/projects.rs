use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::validation;
use super::{ApiError, ApiResponse, AppState, ProjectCreatedPayload, ProjectsPayload};
use crate::db::ProjectPatch;
use crate::services::{CreateProject, CurrentUser};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteProjectRequest {
    pub id: Option<i32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /projects
/// Every project with its bug count, newest first.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProjectsPayload>>, ApiError> {
    let projects = state.projects().list().await?;

    Ok(Json(ApiResponse::success(ProjectsPayload { projects })))
}

/// POST /projects (admin)
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<ApiResponse<ProjectCreatedPayload>>, ApiError> {
    let project = CreateProject {
        name: payload.name.unwrap_or_default().trim().to_string(),
        description: payload.description.unwrap_or_default().trim().to_string(),
        status: validation::non_empty(payload.status),
    };

    let created = state.projects().create(&user, project).await?;

    Ok(Json(ApiResponse::with_message(
        "Project created successfully",
        ProjectCreatedPayload {
            project_id: created.id,
        },
    )))
}

/// PUT /projects (admin)
/// Partial update; only the fields present in the body are written.
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::require_id(payload.id, "Project ID")?;

    let patch = ProjectPatch {
        name: validation::non_empty(payload.name),
        description: validation::non_empty(payload.description),
        status: validation::non_empty(payload.status),
    };

    state.projects().update(&user, id, patch).await?;

    Ok(Json(ApiResponse::message("Project updated successfully")))
}

/// DELETE /projects (admin)
/// Refused while bugs still reference the project.
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DeleteProjectRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::require_id(payload.id, "Project ID")?;

    state.projects().delete(&user, id).await?;

    Ok(Json(ApiResponse::message("Project deleted successfully")))
}
