// src/todos/models.rs

use serde::{Deserialize, Serialize};

/// A todo owned by one user, addressed by `(user_id, todo_id)`.
/// Timestamps are unix milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub user_id: String,
    pub todo_id: String,
    pub text: String,
    pub done: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub text: String,
    #[serde(default)]
    pub due_at: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTodoRequest {
    pub done: bool,
}

#[derive(Serialize, Debug)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}
