use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            status: model.status,
            created_at: model.created_at,
            last_login: model.last_login,
        }
    }
}

/// Input for creating a user row; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Look a user up by username OR email, with the password hash for
    /// credential verification.
    pub async fn get_by_identifier_with_password(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(identifier))
                    .add(users::Column::Email.eq(identifier)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user by identifier")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// True if the username or the email is already taken
    pub async fn identifier_exists(&self, username: &str, email: &str) -> Result<bool> {
        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check username/email uniqueness")?;

        Ok(existing.is_some())
    }

    pub async fn create(&self, user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            status: Set(user.status),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Refresh `last_login` for a user
    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            id: Set(id),
            last_login: Set(Some(now)),
            ..Default::default()
        };
        active
            .update(&self.conn)
            .await
            .context("Failed to update last_login")?;

        Ok(())
    }
}

/// Verify a password against an Argon2id hash.
/// Note: runs under `spawn_blocking` because Argon2 is CPU-intensive and
/// would block the async runtime if run directly.
pub async fn verify_password(password_hash: String, password: String) -> Result<bool> {
    let is_valid = task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")??;

    Ok(is_valid)
}

/// Hash a password on a blocking thread, using the configured Argon2 costs.
pub async fn hash_password_blocking(
    password: String,
    config: Option<SecurityConfig>,
) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, config.as_ref()))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter42", None).unwrap();
        assert!(verify_password(hash.clone(), "hunter42".to_string())
            .await
            .unwrap());
        assert!(!verify_password(hash, "hunter43".to_string()).await.unwrap());
    }
}
