//! Domain service for projects.
//!
//! Any authenticated user may list projects; creating, updating and
//! deleting them is admin-only. A project that still owns bugs cannot be
//! deleted.

use thiserror::Error;

use crate::db::{ProjectPatch, ProjectRow};
use crate::entities::projects;
use crate::services::auth_service::CurrentUser;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Project not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProjectError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProjectError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Creation input; status defaults to "active"
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub status: Option<String>,
}

/// Domain service trait for project operations.
#[async_trait::async_trait]
pub trait ProjectService: Send + Sync {
    /// All projects with their bug counts, newest first.
    async fn list(&self) -> Result<Vec<ProjectRow>, ProjectError>;

    /// Admin-only creation; returns the new row.
    async fn create(
        &self,
        caller: &CurrentUser,
        project: CreateProject,
    ) -> Result<projects::Model, ProjectError>;

    /// Admin-only partial update. An unknown id is [`ProjectError::NotFound`];
    /// an empty patch is [`ProjectError::Validation`].
    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        patch: ProjectPatch,
    ) -> Result<(), ProjectError>;

    /// Admin-only removal; fails with [`ProjectError::Conflict`] while bugs
    /// still reference the project.
    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<(), ProjectError>;
}
