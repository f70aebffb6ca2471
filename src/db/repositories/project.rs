use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{bugs, prelude::*, projects};

/// Project row with its computed bug count
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ProjectRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub bug_count: i64,
}

#[derive(Debug, Default, Clone)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl ProjectPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Outcome of the guarded delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectDeleteOutcome {
    Deleted,
    HasBugs,
    NotFound,
}

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_with_counts(&self) -> Result<Vec<ProjectRow>> {
        Projects::find()
            .column_as(bugs::Column::Id.count(), "bug_count")
            .join(JoinType::LeftJoin, projects::Relation::Bugs.def())
            .group_by(projects::Column::Id)
            .order_by_desc(projects::Column::CreatedAt)
            .into_model::<ProjectRow>()
            .all(&self.conn)
            .await
            .context("Failed to list projects")
    }

    pub async fn get(&self, id: i32) -> Result<Option<projects::Model>> {
        Projects::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project by ID")
    }

    pub async fn create(
        &self,
        name: String,
        description: String,
        status: String,
    ) -> Result<projects::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = projects::ActiveModel {
            name: Set(name),
            description: Set(description),
            status: Set(status),
            created_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert project")
    }

    pub async fn apply_patch(&self, id: i32, patch: &ProjectPatch) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active = projects::ActiveModel {
            id: Set(id),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        if let Some(name) = &patch.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            active.description = Set(description.clone());
        }
        if let Some(status) = &patch.status {
            active.status = Set(status.clone());
        }

        active
            .update(&self.conn)
            .await
            .context("Failed to update project")?;

        Ok(())
    }

    /// Delete a project unless bugs still reference it. The bug-count check
    /// and the delete run in one transaction so a concurrent bug insert
    /// cannot slip between them.
    pub async fn delete_if_empty(&self, id: i32) -> Result<ProjectDeleteOutcome> {
        let txn = self.conn.begin().await.context("Failed to open txn")?;

        let bug_count = Bugs::find()
            .filter(bugs::Column::ProjectId.eq(id))
            .count(&txn)
            .await
            .context("Failed to count project bugs")?;

        if bug_count > 0 {
            txn.rollback().await.context("Failed to roll back txn")?;
            return Ok(ProjectDeleteOutcome::HasBugs);
        }

        let result = Projects::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete project")?;

        txn.commit().await.context("Failed to commit txn")?;

        if result.rows_affected == 0 {
            Ok(ProjectDeleteOutcome::NotFound)
        } else {
            Ok(ProjectDeleteOutcome::Deleted)
        }
    }

    pub async fn count_active(&self) -> Result<u64> {
        Projects::find()
            .filter(projects::Column::Status.eq("active"))
            .count(&self.conn)
            .await
            .context("Failed to count active projects")
    }
}
