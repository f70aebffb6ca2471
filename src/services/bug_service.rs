//! Domain service for bug reports.
//!
//! Listing and creation are open to any authenticated user; changing a bug
//! is limited to admins, the current assignee and the original reporter;
//! deletion is admin-only.

use thiserror::Error;

use crate::db::{BugFilter, BugPatch, BugRow};
use crate::services::auth_service::CurrentUser;

/// The statuses a bug may take on the board
pub const ALLOWED_STATUSES: [&str; 4] = ["open", "in-progress", "testing", "closed"];

#[derive(Debug, Error)]
pub enum BugError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bug not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BugError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BugError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// One page of bugs plus the pagination bookkeeping the client renders
#[derive(Debug)]
pub struct BugListing {
    pub bugs: Vec<BugRow>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

/// Creation input; priority defaults to "medium", status always starts
/// "open", the reporter is the caller.
#[derive(Debug, Clone)]
pub struct CreateBug {
    pub title: String,
    pub description: String,
    pub project_id: i32,
    pub priority: Option<String>,
    pub assigned_to: Option<i32>,
}

/// Domain service trait for bug operations.
#[async_trait::async_trait]
pub trait BugService: Send + Sync {
    /// Filtered, newest-first page of bugs. `page` is 1-based.
    async fn list(
        &self,
        filter: BugFilter,
        page: u64,
        limit: u64,
    ) -> Result<BugListing, BugError>;

    /// Creates a bug reported by `caller` and returns it with the project
    /// name joined in.
    async fn create(&self, caller: &CurrentUser, bug: CreateBug) -> Result<BugRow, BugError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// [`BugError::NotFound`] for an unknown id, [`BugError::PermissionDenied`]
    /// unless the caller is an admin, the assignee or the reporter,
    /// [`BugError::Validation`] when the patch carries no fields.
    async fn update(&self, caller: &CurrentUser, id: i32, patch: BugPatch)
    -> Result<(), BugError>;

    /// Moves a bug to one of [`ALLOWED_STATUSES`]; same permission rule as
    /// [`BugService::update`].
    async fn update_status(
        &self,
        caller: &CurrentUser,
        id: i32,
        status: &str,
    ) -> Result<(), BugError>;

    /// Admin-only removal.
    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<(), BugError>;
}
