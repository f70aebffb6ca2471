//! `SeaORM` implementation of the `ProjectService` trait.

use async_trait::async_trait;

use crate::db::{ProjectDeleteOutcome, ProjectPatch, ProjectRow, Store};
use crate::entities::projects;
use crate::services::auth_service::CurrentUser;
use crate::services::project_service::{CreateProject, ProjectError, ProjectService};

pub struct SeaOrmProjectService {
    store: Store,
}

impl SeaOrmProjectService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn require_admin(caller: &CurrentUser) -> Result<(), ProjectError> {
        if caller.is_admin() {
            Ok(())
        } else {
            Err(ProjectError::PermissionDenied)
        }
    }
}

#[async_trait]
impl ProjectService for SeaOrmProjectService {
    async fn list(&self) -> Result<Vec<ProjectRow>, ProjectError> {
        Ok(self.store.list_projects().await?)
    }

    async fn create(
        &self,
        caller: &CurrentUser,
        project: CreateProject,
    ) -> Result<projects::Model, ProjectError> {
        Self::require_admin(caller)?;

        if project.name.is_empty() {
            return Err(ProjectError::Validation(
                "Project name is required".to_string(),
            ));
        }

        let status = project
            .status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "active".to_string());

        let created = self
            .store
            .create_project(project.name, project.description, status)
            .await?;

        tracing::info!(project_id = created.id, created_by = caller.id, "Project created");

        Ok(created)
    }

    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        patch: ProjectPatch,
    ) -> Result<(), ProjectError> {
        Self::require_admin(caller)?;

        // Missing ids are rejected up front, the same policy as bug updates
        self.store
            .get_project(id)
            .await?
            .ok_or(ProjectError::NotFound)?;

        if patch.is_empty() {
            return Err(ProjectError::Validation("No fields to update".to_string()));
        }

        self.store.patch_project(id, &patch).await?;

        Ok(())
    }

    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<(), ProjectError> {
        Self::require_admin(caller)?;

        match self.store.delete_project_if_empty(id).await? {
            ProjectDeleteOutcome::Deleted => {
                tracing::info!(project_id = id, deleted_by = caller.id, "Project deleted");
                Ok(())
            }
            ProjectDeleteOutcome::HasBugs => Err(ProjectError::Conflict(
                "Cannot delete project with existing bugs".to_string(),
            )),
            ProjectDeleteOutcome::NotFound => Err(ProjectError::NotFound),
        }
    }
}
