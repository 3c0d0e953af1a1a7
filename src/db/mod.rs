use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::todo::{Todo, TodoPatch};
pub use repositories::user::User;

/// Row timestamp: RFC 3339 in UTC with fixed microsecond precision, so
/// lexical order matches chronological order.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

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

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

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

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn todo_repo(&self) -> repositories::todo::TodoRepository {
        repositories::todo::TodoRepository::new(self.conn.clone())
    }

    fn revoked_token_repo(&self) -> repositories::revoked_token::RevokedTokenRepository {
        repositories::revoked_token::RevokedTokenRepository::new(self.conn.clone())
    }

    // Users

    /// Returns `None` when the email is already registered.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(username, email, password, security)
            .await
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    /// `security` must match the settings users are hashed with; it sizes
    /// the dummy check done for unknown emails.
    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_credentials(email, password, security)
            .await
    }

    // Todos

    pub async fn create_todo(&self, owner: Uuid, title: &str, description: &str) -> Result<Todo> {
        self.todo_repo().create(owner, title, description).await
    }

    pub async fn get_todo(&self, id: Uuid) -> Result<Option<Todo>> {
        self.todo_repo().get(id).await
    }

    pub async fn list_todos_for_owner(&self, owner: Uuid) -> Result<Vec<Todo>> {
        self.todo_repo().list_for_owner(owner).await
    }

    pub async fn update_todo(&self, id: Uuid, owner: Uuid, patch: &TodoPatch) -> Result<bool> {
        self.todo_repo().update(id, owner, patch).await
    }

    pub async fn delete_todo(&self, id: Uuid, owner: Uuid) -> Result<bool> {
        self.todo_repo().delete(id, owner).await
    }

    // Revocation ledger

    pub async fn revoke_token(&self, token: &str, user_id: Uuid, expires_at: i64) -> Result<()> {
        self.revoked_token_repo()
            .revoke(token, user_id, expires_at)
            .await
    }

    pub async fn is_token_revoked(&self, token: &str, now: i64) -> Result<bool> {
        self.revoked_token_repo().is_revoked(token, now).await
    }

    pub async fn purge_expired_tokens(&self, now: i64) -> Result<u64> {
        self.revoked_token_repo().purge_expired(now).await
    }
}
