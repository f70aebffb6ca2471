//! `SeaORM` implementation of the `BugService` trait.

use async_trait::async_trait;

use crate::db::{BugFilter, BugPatch, BugRow, NewBug, Store};
use crate::entities::bugs;
use crate::services::auth_service::CurrentUser;
use crate::services::bug_service::{
    ALLOWED_STATUSES, BugError, BugListing, BugService, CreateBug,
};

pub struct SeaOrmBugService {
    store: Store,
}

impl SeaOrmBugService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Admins, the current assignee and the original reporter may modify a
    /// bug; nobody else.
    fn can_modify(caller: &CurrentUser, bug: &bugs::Model) -> bool {
        caller.is_admin() || bug.assigned_to == Some(caller.id) || bug.reported_by == caller.id
    }

    async fn fetch_for_modify(
        &self,
        caller: &CurrentUser,
        id: i32,
    ) -> Result<bugs::Model, BugError> {
        let bug = self.store.get_bug(id).await?.ok_or(BugError::NotFound)?;

        if !Self::can_modify(caller, &bug) {
            return Err(BugError::PermissionDenied);
        }

        Ok(bug)
    }
}

#[async_trait]
impl BugService for SeaOrmBugService {
    async fn list(
        &self,
        filter: BugFilter,
        page: u64,
        limit: u64,
    ) -> Result<BugListing, BugError> {
        let (bugs, total, pages) = self.store.list_bugs(&filter, page, limit).await?;

        Ok(BugListing {
            bugs,
            page,
            limit,
            total,
            pages,
        })
    }

    async fn create(&self, caller: &CurrentUser, bug: CreateBug) -> Result<BugRow, BugError> {
        if bug.title.is_empty() || bug.description.is_empty() || bug.project_id <= 0 {
            return Err(BugError::Validation(
                "Title, description, and project are required".to_string(),
            ));
        }

        let priority = bug
            .priority
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "medium".to_string());

        // An assignee of zero means "nobody"
        let assigned_to = bug.assigned_to.filter(|id| *id > 0);

        let created = self
            .store
            .create_bug(NewBug {
                title: bug.title,
                description: bug.description,
                project_id: bug.project_id,
                priority,
                assigned_to,
                reported_by: caller.id,
            })
            .await?;

        tracing::info!(bug_id = created.id, reported_by = caller.id, "Bug created");

        Ok(created)
    }

    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        patch: BugPatch,
    ) -> Result<(), BugError> {
        self.fetch_for_modify(caller, id).await?;

        if patch.is_empty() {
            return Err(BugError::Validation("No fields to update".to_string()));
        }

        self.store.patch_bug(id, &patch).await?;

        Ok(())
    }

    async fn update_status(
        &self,
        caller: &CurrentUser,
        id: i32,
        status: &str,
    ) -> Result<(), BugError> {
        if !ALLOWED_STATUSES.contains(&status) {
            return Err(BugError::Validation("Invalid status".to_string()));
        }

        self.fetch_for_modify(caller, id).await?;

        let patch = BugPatch {
            status: Some(status.to_string()),
            ..Default::default()
        };
        self.store.patch_bug(id, &patch).await?;

        tracing::info!(bug_id = id, status, "Bug status updated");

        Ok(())
    }

    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<(), BugError> {
        if !caller.is_admin() {
            return Err(BugError::PermissionDenied);
        }

        let deleted = self.store.delete_bug(id).await?;
        if deleted == 0 {
            return Err(BugError::NotFound);
        }

        tracing::info!(bug_id = id, deleted_by = caller.id, "Bug deleted");

        Ok(())
    }
}
