use serde::Serialize;

use crate::db::{BugRow, ProjectRow};
use crate::services::{BugListing, UserView};

/// Uniform response envelope: `{"success": ..., "message": ..., ...payload}`.
/// The payload is flattened into the envelope so clients see e.g.
/// `{"success": true, "message": "Success", "bugs": [...], "pagination": {...}}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message("Success", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct BugsPayload {
    pub bugs: Vec<BugRow>,
    pub pagination: Pagination,
}

impl From<BugListing> for BugsPayload {
    fn from(listing: BugListing) -> Self {
        Self {
            bugs: listing.bugs,
            pagination: Pagination {
                page: listing.page,
                limit: listing.limit,
                total: listing.total,
                pages: listing.pages,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BugPayload {
    pub bug: BugRow,
}

#[derive(Debug, Serialize)]
pub struct ProjectsPayload {
    pub projects: Vec<ProjectRow>,
}

#[derive(Debug, Serialize)]
pub struct ProjectCreatedPayload {
    pub project_id: i32,
}
