use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};
use tokio::task;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::config::SecurityConfig;
use crate::db::timestamp_now;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Hashes verified against when the email is unknown, one per Argon2 setting,
/// so a miss costs about as much as a wrong password.
static DUMMY_HASHES: LazyLock<Mutex<HashMap<SecurityConfig, String>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// CPU heavy on first use per setting; call from a blocking task.
fn dummy_hash(security: &SecurityConfig) -> Option<String> {
    let mut hashes = DUMMY_HASHES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(hash) = hashes.get(security) {
        return Some(hash.clone());
    }

    let hash = hash_password("taskd-dummy-password", security).ok()?;
    hashes.insert(security.clone(), hash.clone());
    Some(hash)
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Hash the password and insert the user.
    /// Returns `None` if the email is already taken.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = timestamp_now();
        let active = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(None),
                _ => Err(anyhow::Error::new(err).context("Failed to insert user")),
            },
        }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Returns the user if the email exists and the password matches.
    /// Unknown email and wrong password both yield `None`.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let password = password.to_string();

        let Some(user) = user else {
            let security = security.clone();
            task::spawn_blocking(move || {
                if let Some(hash) = dummy_hash(&security) {
                    let _ = verify_password(&password, &hash);
                }
            })
            .await
            .context("Password verification task panicked")?;
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{fast_security, memory_store};

    #[tokio::test]
    async fn create_and_lookup() {
        let store = memory_store().await;

        let user = store
            .create_user("alice", "alice@x.com", "pw123", &fast_security())
            .await
            .unwrap()
            .expect("user created");

        assert_eq!(user.username, "alice");
        assert_eq!(store.get_user_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store.get_user_by_email("alice@x.com").await.unwrap(),
            Some(user)
        );
        assert!(store.get_user_by_email("bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_returns_none() {
        let store = memory_store().await;
        let security = fast_security();

        assert!(
            store
                .create_user("alice", "alice@x.com", "pw123", &security)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .create_user("alice2", "alice@x.com", "other", &security)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn dummy_hash_uses_the_configured_argon2_costs() {
        let fast = fast_security();
        let hash = dummy_hash(&fast).unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"), "{hash}");
        assert_eq!(dummy_hash(&fast), Some(hash));

        let heavier = SecurityConfig {
            argon2_memory_cost_kib: 2048,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        };
        assert!(dummy_hash(&heavier).unwrap().contains("m=2048,t=2,p=1"));
    }

    #[tokio::test]
    async fn verify_credentials_hides_which_part_was_wrong() {
        let store = memory_store().await;
        let security = fast_security();
        let user = store
            .create_user("alice", "alice@x.com", "pw123", &security)
            .await
            .unwrap()
            .unwrap();

        let ok = store
            .verify_user_credentials("alice@x.com", "pw123", &security)
            .await
            .unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(
            store
                .verify_user_credentials("alice@x.com", "wrong", &security)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .verify_user_credentials("nobody@x.com", "pw123", &security)
                .await
                .unwrap()
                .is_none()
        );
    }
}
