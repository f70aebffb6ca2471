use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{bugs, projects};

pub mod migrator;
pub mod repositories;

pub use repositories::bug::{
    BugFilter, BugPatch, BugRow, NewBug, PriorityCount, StatusCount,
};
pub use repositories::project::{ProjectDeleteOutcome, ProjectPatch, ProjectRow};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // An in-memory SQLite database exists per connection, so the pool
        // must stay at a single connection or queries would miss the
        // migrated schema.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn bug_repo(&self) -> repositories::bug::BugRepository {
        repositories::bug::BugRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_with_password(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_identifier_with_password(identifier)
            .await
    }

    pub async fn user_identifier_exists(&self, username: &str, email: &str) -> Result<bool> {
        self.user_repo().identifier_exists(username, email).await
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().create(user).await
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        self.user_repo().touch_last_login(id).await
    }

    // ------------------------------------------------------------------
    // Bugs
    // ------------------------------------------------------------------

    pub async fn list_bugs(
        &self,
        filter: &BugFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BugRow>, u64, u64)> {
        self.bug_repo().list(filter, page, limit).await
    }

    pub async fn get_bug(&self, id: i32) -> Result<Option<bugs::Model>> {
        self.bug_repo().get(id).await
    }

    pub async fn get_bug_row(&self, id: i32) -> Result<Option<BugRow>> {
        self.bug_repo().get_row(id).await
    }

    pub async fn create_bug(&self, bug: NewBug) -> Result<BugRow> {
        self.bug_repo().create(bug).await
    }

    pub async fn patch_bug(&self, id: i32, patch: &BugPatch) -> Result<()> {
        self.bug_repo().apply_patch(id, patch).await
    }

    pub async fn delete_bug(&self, id: i32) -> Result<u64> {
        self.bug_repo().delete(id).await
    }

    pub async fn count_bugs(&self) -> Result<u64> {
        self.bug_repo().count_all().await
    }

    pub async fn count_bugs_by_status(&self, status: &str) -> Result<u64> {
        self.bug_repo().count_by_status(status).await
    }

    pub async fn count_open_critical_bugs(&self) -> Result<u64> {
        self.bug_repo().count_open_critical().await
    }

    pub async fn recent_bugs(&self, limit: u64) -> Result<Vec<BugRow>> {
        self.bug_repo().recent(limit).await
    }

    pub async fn bugs_assigned_to(&self, user_id: i32, limit: u64) -> Result<Vec<BugRow>> {
        self.bug_repo().assigned_to_user(user_id, limit).await
    }

    pub async fn bug_status_distribution(&self) -> Result<Vec<StatusCount>> {
        self.bug_repo().status_distribution().await
    }

    pub async fn bug_priority_distribution(&self) -> Result<Vec<PriorityCount>> {
        self.bug_repo().priority_distribution().await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        self.project_repo().list_with_counts().await
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<projects::Model>> {
        self.project_repo().get(id).await
    }

    pub async fn create_project(
        &self,
        name: String,
        description: String,
        status: String,
    ) -> Result<projects::Model> {
        self.project_repo().create(name, description, status).await
    }

    pub async fn patch_project(&self, id: i32, patch: &ProjectPatch) -> Result<()> {
        self.project_repo().apply_patch(id, patch).await
    }

    pub async fn delete_project_if_empty(&self, id: i32) -> Result<ProjectDeleteOutcome> {
        self.project_repo().delete_if_empty(id).await
    }

    pub async fn count_active_projects(&self) -> Result<u64> {
        self.project_repo().count_active().await
    }
}
