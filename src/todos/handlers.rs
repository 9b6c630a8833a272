// src/todos/handlers.rs

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::models::{CreateTodoRequest, Todo, TodoListResponse, UpdateTodoRequest};
use super::validators::CreateTodoValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

/// GET /api/todos - List the authenticated user's todos
pub async fn list_todos(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<TodoListResponse>, ApiError> {
    let todos = state.todos.list_todos(&authed.id).await.map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Store error listing todos");
        ApiError::from(e)
    })?;

    debug!(
        user_id = %authed.id,
        todo_count = todos.len(),
        "Successfully fetched todos"
    );

    Ok(Json(TodoListResponse { todos }))
}

/// POST /api/todos - Create a todo with a freshly generated id
pub async fn create_todo(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(user_id = %authed.id, error = %e, "Malformed todo body");
        ApiError::BadRequest("bad request".to_string())
    })?;

    CreateTodoValidator.validate(&request).into_result().map_err(|result| {
        warn!(
            user_id = %authed.id,
            errors = ?result.errors,
            "Todo creation validation failed"
        );
        ApiError::from(result)
    })?;

    let todo_id = (state.new_todo_id)();
    let todo = state
        .todos
        .create_todo(&authed.id, &todo_id, request.text.trim(), request.due_at)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %authed.id,
                todo_id = %todo_id,
                "Store error creating todo"
            );
            ApiError::from(e)
        })?;

    info!(user_id = %authed.id, todo_id = %todo.todo_id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// PATCH /api/todos/:id - Set the done flag
pub async fn update_todo(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(todo_id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(user_id = %authed.id, error = %e, "Malformed todo update body");
        ApiError::BadRequest("bad request".to_string())
    })?;

    state
        .todos
        .update_todo_done(&authed.id, &todo_id, request.done)
        .await
        .map_err(|e| {
            warn!(
                error = %e,
                user_id = %authed.id,
                todo_id = %todo_id,
                "Failed to update todo"
            );
            ApiError::from(e)
        })?;

    info!(user_id = %authed.id, todo_id = %todo_id, done = request.done, "Todo updated");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/todos/:id - Remove a todo; missing todos are not an error
pub async fn delete_todo(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .todos
        .delete_todo(&authed.id, &todo_id)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %authed.id,
                todo_id = %todo_id,
                "Store error deleting todo"
            );
            ApiError::from(e)
        })?;

    info!(user_id = %authed.id, todo_id = %todo_id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
