//! Domain service for per-user todo items.

use thiserror::Error;
use uuid::Uuid;

use crate::db::{Todo, TodoPatch};

#[derive(Debug, Error)]
pub enum TodoError {
    /// Missing, or owned by someone else. The two are not distinguished.
    #[error("Todo not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for TodoError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TodoError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Every operation takes the authenticated caller as `owner`.
#[async_trait::async_trait]
pub trait TodoService: Send + Sync {
    async fn create(&self, owner: Uuid, title: &str, description: &str)
    -> Result<Todo, TodoError>;

    /// Newest first.
    async fn list(&self, owner: Uuid) -> Result<Vec<Todo>, TodoError>;

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Todo, TodoError>;

    /// Empty title or description in `patch` leave the field unchanged.
    async fn update(&self, owner: Uuid, id: Uuid, patch: TodoPatch) -> Result<Todo, TodoError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), TodoError>;
}
