//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::repositories::user;
use crate::db::{NewUser, Store};
use crate::services::auth_service::{
    AuthError, AuthService, CurrentUser, Registration, UserView,
};

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, identifier: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let Some((found, password_hash)) = self.store.get_user_with_password(identifier).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if found.status != "active" {
            return Err(AuthError::AccountInactive);
        }

        let is_valid = user::verify_password(password_hash, password.to_string()).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.touch_last_login(found.id).await?;

        tracing::info!(user_id = found.id, username = %found.username, "User logged in");

        Ok(CurrentUser {
            id: found.id,
            username: found.username,
            email: found.email,
            role: found.role,
        })
    }

    async fn register(&self, registration: Registration) -> Result<CurrentUser, AuthError> {
        let Registration {
            username,
            email,
            password,
            confirm_password,
        } = registration;

        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("All fields are required".to_string()));
        }

        if !email_address::EmailAddress::is_valid(&email) {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }

        let security = self.config.read().await.security.clone();

        if password.len() < security.password_min_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                security.password_min_length
            )));
        }

        if password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }

        if self.store.user_identifier_exists(&username, &email).await? {
            return Err(AuthError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = user::hash_password_blocking(password, Some(security)).await?;

        let created = self
            .store
            .create_user(NewUser {
                username,
                email,
                password_hash,
                role: "user".to_string(),
                status: "active".to_string(),
            })
            .await?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");

        Ok(CurrentUser {
            id: created.id,
            username: created.username,
            email: created.email,
            role: created.role,
        })
    }

    async fn current_user(&self, user_id: i32) -> Result<UserView, AuthError> {
        let found = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserView {
            id: found.id,
            username: found.username,
            email: found.email,
            role: found.role,
        })
    }
}
