use crate::db::timestamp_now;
use crate::entities::{prelude::*, todos};
use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

/// Repository for todo items. Mutations are always scoped by owner.
pub struct TodoRepository {
    conn: DatabaseConnection,
}

impl TodoRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, owner: Uuid, title: &str, description: &str) -> Result<Todo> {
        let now = timestamp_now();
        let active_model = todos::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            completed: Set(false),
            user_id: Set(owner),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert todo")?;

        Ok(Todo::from(model))
    }

    /// Load by id regardless of owner; callers do the ownership comparison.
    pub async fn get(&self, id: Uuid) -> Result<Option<Todo>> {
        let result = Todos::find_by_id(id).one(&self.conn).await?;
        Ok(result.map(Todo::from))
    }

    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Todo>> {
        let rows = Todos::find()
            .filter(todos::Column::UserId.eq(owner))
            .order_by_desc(todos::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    /// Applies the set fields of `patch`. Returns `false` when no row matched
    /// `(id, owner)`, which covers both "missing" and "not yours".
    pub async fn update(&self, id: Uuid, owner: Uuid, patch: &TodoPatch) -> Result<bool> {
        let mut update = Todos::update_many()
            .col_expr(todos::Column::UpdatedAt, Expr::value(timestamp_now()))
            .filter(todos::Column::Id.eq(id))
            .filter(todos::Column::UserId.eq(owner));

        if let Some(title) = &patch.title {
            update = update.col_expr(todos::Column::Title, Expr::value(title.clone()));
        }

        if let Some(description) = &patch.description {
            update = update.col_expr(todos::Column::Description, Expr::value(description.clone()));
        }

        if let Some(completed) = patch.completed {
            update = update.col_expr(todos::Column::Completed, Expr::value(completed));
        }

        let result = update.exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Returns `false` when no row matched `(id, owner)`.
    pub async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool> {
        let result = Todos::delete_many()
            .filter(todos::Column::Id.eq(id))
            .filter(todos::Column::UserId.eq(owner))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub owner_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<todos::Model> for Todo {
    fn from(m: todos::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            completed: m.completed,
            owner_id: m.user_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{fast_security, memory_store};

    async fn two_users(store: &crate::db::Store) -> (Uuid, Uuid) {
        let security = fast_security();
        let a = store
            .create_user("alice", "alice@x.com", "pw", &security)
            .await
            .unwrap()
            .unwrap();
        let b = store
            .create_user("bob", "bob@x.com", "pw", &security)
            .await
            .unwrap()
            .unwrap();
        (a.id, b.id)
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let store = memory_store().await;
        let (alice, bob) = two_users(&store).await;

        let first = store.create_todo(alice, "first", "").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_todo(alice, "second", "desc").await.unwrap();
        store.create_todo(bob, "bob's", "").await.unwrap();

        assert!(!first.completed);
        assert_eq!(first.owner_id, alice);
        assert_eq!(store.get_todo(first.id).await.unwrap(), Some(first.clone()));

        let listed = store.list_todos_for_owner(alice).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn update_only_touches_owned_rows() {
        let store = memory_store().await;
        let (alice, bob) = two_users(&store).await;
        let todo = store.create_todo(alice, "title", "desc").await.unwrap();

        let patch = TodoPatch {
            completed: Some(true),
            ..TodoPatch::default()
        };

        assert!(!store.update_todo(todo.id, bob, &patch).await.unwrap());
        assert!(!store.get_todo(todo.id).await.unwrap().unwrap().completed);

        assert!(store.update_todo(todo.id, alice, &patch).await.unwrap());
        let updated = store.get_todo(todo.id).await.unwrap().unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "title");
        assert_eq!(updated.description, "desc");

        assert!(
            !store
                .update_todo(Uuid::new_v4(), alice, &patch)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn delete_only_touches_owned_rows() {
        let store = memory_store().await;
        let (alice, bob) = two_users(&store).await;
        let todo = store.create_todo(alice, "title", "").await.unwrap();

        assert!(!store.delete_todo(todo.id, bob).await.unwrap());
        assert!(store.get_todo(todo.id).await.unwrap().is_some());

        assert!(store.delete_todo(todo.id, alice).await.unwrap());
        assert!(store.get_todo(todo.id).await.unwrap().is_none());
        assert!(!store.delete_todo(todo.id, alice).await.unwrap());
    }
}
