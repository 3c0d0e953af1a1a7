//! `SeaORM` implementation of the `TodoService` trait.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::db::{Store, Todo, TodoPatch};
use crate::services::todo_service::{TodoError, TodoService};
use crate::services::validation;

pub struct SeaOrmTodoService {
    store: Store,
}

impl SeaOrmTodoService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Empty strings mean "leave as is"; a present title is validated.
    fn normalize_patch(patch: TodoPatch) -> Result<TodoPatch, TodoError> {
        let title = match patch.title.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(title) => Some(
                validation::validate_title(title)
                    .map_err(TodoError::Validation)?
                    .to_string(),
            ),
        };

        let description = patch.description.filter(|d| !d.is_empty());

        Ok(TodoPatch {
            title,
            description,
            completed: patch.completed,
        })
    }
}

#[async_trait]
impl TodoService for SeaOrmTodoService {
    async fn create(
        &self,
        owner: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Todo, TodoError> {
        let title = validation::validate_title(title).map_err(TodoError::Validation)?;

        let todo = self.store.create_todo(owner, title, description).await?;

        info!(todo_id = %todo.id, user_id = %owner, "Created todo");
        Ok(todo)
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.list_todos_for_owner(owner).await?)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Todo, TodoError> {
        self.store
            .get_todo(id)
            .await?
            .filter(|todo| todo.owner_id == owner)
            .ok_or(TodoError::NotFound)
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: TodoPatch) -> Result<Todo, TodoError> {
        let patch = Self::normalize_patch(patch)?;

        if !self.store.update_todo(id, owner, &patch).await? {
            return Err(TodoError::NotFound);
        }

        self.get(owner, id).await
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), TodoError> {
        if !self.store.delete_todo(id, owner).await? {
            return Err(TodoError::NotFound);
        }

        info!(todo_id = %id, user_id = %owner, "Deleted todo");
        Ok(())
    }
}
