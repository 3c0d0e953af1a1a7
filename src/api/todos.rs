//! Todo CRUD endpoints.
//!
//! Every handler acts on behalf of the [`CurrentUser`]; todos owned by
//! anyone else are reported as not found.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::parse_todo_id;
use super::{ApiError, ApiJson, ApiResponse, AppState, TodoDto};
use crate::db::TodoPatch;
use crate::services::TodoError;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl From<UpdateTodoRequest> for TodoPatch {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            completed: req.completed,
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound => Self::todo_not_found(),
            TodoError::Validation(msg) => Self::validation(msg),
            TodoError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// Creates a todo owned by the caller.
///
/// # Endpoint
/// `POST /api/todos`
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TodoDto>>), ApiError> {
    let todo = state
        .todo_service()
        .create(user.id, &payload.title, &payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(todo.into()))))
}

/// Lists the caller's todos, newest first.
///
/// # Endpoint
/// `GET /api/todos`
pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<TodoDto>>>, ApiError> {
    let todos = state.todo_service().list(user.id).await?;
    Ok(Json(ApiResponse::success(
        todos.into_iter().map(TodoDto::from).collect(),
    )))
}

/// # Endpoint
/// `GET /api/todos/{id}`
///
/// # Errors
/// 400 for a malformed id, 404 if missing or not owned by the caller.
pub async fn get_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TodoDto>>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state.todo_service().get(user.id, id).await?;
    Ok(Json(ApiResponse::success(todo.into())))
}

/// Partial update. Omitted or empty `title`/`description` are left as is.
///
/// # Endpoint
/// `PUT /api/todos/{id}`
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateTodoRequest>,
) -> Result<Json<ApiResponse<TodoDto>>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state
        .todo_service()
        .update(user.id, id, payload.into())
        .await?;
    Ok(Json(ApiResponse::success(todo.into())))
}

/// # Endpoint
/// `DELETE /api/todos/{id}`
pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_todo_id(&id)?;
    state.todo_service().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
