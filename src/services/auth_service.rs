//! Domain service for authentication and account management.
//!
//! Handles login, registration and current-user lookup. Session storage
//! itself lives at the HTTP layer; this service only decides who a caller
//! is allowed to be.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately covers both "no such user" and "wrong password" so the
    /// response cannot be used to enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not active")]
    AccountInactive,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The authenticated identity of a request. Stored in the session at
/// login and injected into request extensions by the auth middleware, so
/// handlers never consult ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Sanitized user view returned by auth endpoints; never carries password
/// material.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<CurrentUser> for UserView {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Registration input as received from the client
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials (username or email) and returns the identity to
    /// put in the session. Refreshes the user's `last_login`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for unknown users and bad
    /// passwords alike, [`AuthError::AccountInactive`] for suspended
    /// accounts.
    async fn login(&self, identifier: &str, password: &str) -> Result<CurrentUser, AuthError>;

    /// Creates a user account (role "user", status "active") and returns
    /// the identity; registration implies login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for malformed input and
    /// [`AuthError::Conflict`] when the username or email is taken.
    async fn register(&self, registration: Registration) -> Result<CurrentUser, AuthError>;

    /// Re-reads the caller's user row; the session alone is not trusted to
    /// still reflect a live account.
    async fn current_user(&self, user_id: i32) -> Result<UserView, AuthError>;
}
