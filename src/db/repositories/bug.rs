use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::Serialize;

use crate::entities::{bugs, prelude::*, projects, users};

/// Bug row joined with its project name and assignee username
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct BugRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub project_id: i32,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<i32>,
    pub reported_by: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub project_name: Option<String>,
    pub assigned_to_name: Option<String>,
}

/// Conjunction of optional list filters; unset fields are omitted from the
/// query entirely.
#[derive(Debug, Default, Clone)]
pub struct BugFilter {
    pub project_id: Option<i32>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i32>,
}

/// Typed partial update. `assigned_to` is two-level: the outer `None` means
/// "key absent, leave alone", `Some(None)` means "unassign".
#[derive(Debug, Default, Clone)]
pub struct BugPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<Option<i32>>,
}

impl BugPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewBug {
    pub title: String,
    pub description: String,
    pub project_id: i32,
    pub priority: String,
    pub assigned_to: Option<i32>,
    pub reported_by: i32,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct PriorityCount {
    pub priority: String,
    pub count: i64,
}

pub struct BugRepository {
    conn: DatabaseConnection,
}

impl BugRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Base select with the project and assignee joined in
    fn joined() -> Select<Bugs> {
        Bugs::find()
            .column_as(projects::Column::Name, "project_name")
            .column_as(users::Column::Username, "assigned_to_name")
            .join(JoinType::LeftJoin, bugs::Relation::Project.def())
            .join(JoinType::LeftJoin, bugs::Relation::Assignee.def())
    }

    fn newest_first(query: Select<Bugs>) -> Select<Bugs> {
        // Secondary id ordering keeps pagination stable when timestamps tie
        query
            .order_by_desc(bugs::Column::CreatedAt)
            .order_by_desc(bugs::Column::Id)
    }

    /// Filtered, newest-first page of bugs plus total row and page counts.
    /// `page` is 1-based.
    pub async fn list(
        &self,
        filter: &BugFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BugRow>, u64, u64)> {
        let mut query = Self::joined();

        if let Some(project_id) = filter.project_id {
            query = query.filter(bugs::Column::ProjectId.eq(project_id));
        }
        if let Some(status) = &filter.status {
            query = query.filter(bugs::Column::Status.eq(status.as_str()));
        }
        if let Some(priority) = &filter.priority {
            query = query.filter(bugs::Column::Priority.eq(priority.as_str()));
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.filter(bugs::Column::AssignedTo.eq(assigned_to));
        }

        let paginator = Self::newest_first(query)
            .into_model::<BugRow>()
            .paginate(&self.conn, limit);

        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count bugs")?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch bug page")?;

        Ok((rows, totals.number_of_items, totals.number_of_pages))
    }

    pub async fn get(&self, id: i32) -> Result<Option<bugs::Model>> {
        Bugs::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bug by ID")
    }

    /// Single bug with the project/assignee names joined in
    pub async fn get_row(&self, id: i32) -> Result<Option<BugRow>> {
        Self::joined()
            .filter(bugs::Column::Id.eq(id))
            .into_model::<BugRow>()
            .one(&self.conn)
            .await
            .context("Failed to query bug row by ID")
    }

    pub async fn create(&self, bug: NewBug) -> Result<BugRow> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = bugs::ActiveModel {
            title: Set(bug.title),
            description: Set(bug.description),
            project_id: Set(bug.project_id),
            priority: Set(bug.priority),
            status: Set("open".to_string()),
            assigned_to: Set(bug.assigned_to),
            reported_by: Set(bug.reported_by),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert bug")?;

        self.get_row(model.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created bug {} not found", model.id))
    }

    /// Apply a partial update; only the set fields are written, `updated_at`
    /// always is.
    pub async fn apply_patch(&self, id: i32, patch: &BugPatch) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active = bugs::ActiveModel {
            id: Set(id),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        if let Some(title) = &patch.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &patch.description {
            active.description = Set(description.clone());
        }
        if let Some(priority) = &patch.priority {
            active.priority = Set(priority.clone());
        }
        if let Some(status) = &patch.status {
            active.status = Set(status.clone());
        }
        if let Some(assigned_to) = patch.assigned_to {
            active.assigned_to = Set(assigned_to);
        }

        active
            .update(&self.conn)
            .await
            .context("Failed to update bug")?;

        Ok(())
    }

    /// Returns the number of rows deleted (0 or 1)
    pub async fn delete(&self, id: i32) -> Result<u64> {
        let result = Bugs::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete bug")?;

        Ok(result.rows_affected)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Bugs::find()
            .count(&self.conn)
            .await
            .context("Failed to count bugs")
    }

    pub async fn count_by_status(&self, status: &str) -> Result<u64> {
        Bugs::find()
            .filter(bugs::Column::Status.eq(status))
            .count(&self.conn)
            .await
            .context("Failed to count bugs by status")
    }

    /// High-priority bugs that are not closed yet
    pub async fn count_open_critical(&self) -> Result<u64> {
        Bugs::find()
            .filter(bugs::Column::Priority.eq("high"))
            .filter(bugs::Column::Status.ne("closed"))
            .count(&self.conn)
            .await
            .context("Failed to count critical bugs")
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<BugRow>> {
        Self::newest_first(Self::joined())
            .limit(limit)
            .into_model::<BugRow>()
            .all(&self.conn)
            .await
            .context("Failed to fetch recent bugs")
    }

    pub async fn assigned_to_user(&self, user_id: i32, limit: u64) -> Result<Vec<BugRow>> {
        Self::newest_first(Self::joined().filter(bugs::Column::AssignedTo.eq(user_id)))
            .limit(limit)
            .into_model::<BugRow>()
            .all(&self.conn)
            .await
            .context("Failed to fetch assigned bugs")
    }

    pub async fn status_distribution(&self) -> Result<Vec<StatusCount>> {
        Bugs::find()
            .select_only()
            .column(bugs::Column::Status)
            .column_as(bugs::Column::Id.count(), "count")
            .group_by(bugs::Column::Status)
            .into_model::<StatusCount>()
            .all(&self.conn)
            .await
            .context("Failed to group bugs by status")
    }

    pub async fn priority_distribution(&self) -> Result<Vec<PriorityCount>> {
        Bugs::find()
            .select_only()
            .column(bugs::Column::Priority)
            .column_as(bugs::Column::Id.count(), "count")
            .group_by(bugs::Column::Priority)
            .into_model::<PriorityCount>()
            .all(&self.conn)
            .await
            .context("Failed to group bugs by priority")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_empty() {
        assert!(BugPatch::default().is_empty());

        let patch = BugPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
