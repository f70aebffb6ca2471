use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, BugError, DashboardError, ProjectError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    PermissionDenied(String),

    NotFound(String),

    /// Uniqueness or referential-constraint failures. This API reports them
    /// with HTTP 400, not 409.
    Conflict(String),

    MethodNotAllowed(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::MethodNotAllowed(msg) => write!(f, "Method not allowed: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<BugError> for ApiError {
    fn from(err: BugError) -> Self {
        match err {
            BugError::Validation(msg) => ApiError::ValidationError(msg),
            BugError::NotFound => ApiError::NotFound("Bug not found".to_string()),
            BugError::PermissionDenied => {
                ApiError::PermissionDenied("Permission denied".to_string())
            }
            BugError::Database(msg) => ApiError::DatabaseError(msg),
            BugError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Validation(msg) => ApiError::ValidationError(msg),
            ProjectError::NotFound => ApiError::NotFound("Project not found".to_string()),
            ProjectError::PermissionDenied => {
                ApiError::PermissionDenied("Admin access required".to_string())
            }
            ProjectError::Conflict(msg) => ApiError::Conflict(msg),
            ProjectError::Database(msg) => ApiError::DatabaseError(msg),
            ProjectError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Database(msg) => ApiError::DatabaseError(msg),
            DashboardError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
