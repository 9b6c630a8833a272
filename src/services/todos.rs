// src/services/todos.rs
//! Per-user todo records
//!
//! Creation is create-once: the write carries an "item must not exist"
//! precondition that the engine checks atomically, so two concurrent creators
//! of the same `(user_id, todo_id)` cannot both succeed. Updates and deletes
//! are unconditional.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{from_item, to_item, Engine, Item, Key, StoreError, Table};
use crate::todos::models::Todo;

#[derive(Clone)]
pub struct TodoStore {
    engine: Arc<dyn Engine>,
    table: Table,
}

impl TodoStore {
    pub fn new(engine: Arc<dyn Engine>, table_name: impl Into<String>) -> Self {
        Self {
            engine,
            table: Table::new(table_name, "userId").with_sort_key("todoId"),
        }
    }

    /// Returns [`StoreError::AlreadyExists`] if the id is taken. Callers should
    /// pick a new id rather than retry.
    pub async fn create_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        text: &str,
        due_at: Option<i64>,
    ) -> Result<Todo, StoreError> {
        let now = Utc::now().timestamp_millis();
        let todo = Todo {
            user_id: user_id.to_string(),
            todo_id: todo_id.to_string(),
            text: text.to_string(),
            done: false,
            created_at: now,
            updated_at: now,
            due_at,
        };

        match self
            .engine
            .put_item_if_absent(&self.table, to_item(&todo)?)
            .await
        {
            Ok(()) => {
                debug!(user_id = %user_id, todo_id = %todo_id, "Todo created");
                Ok(todo)
            }
            Err(StoreError::AlreadyExists) => {
                warn!(user_id = %user_id, todo_id = %todo_id, "Todo id collision on create");
                Err(StoreError::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_todos(&self, user_id: &str) -> Result<Vec<Todo>, StoreError> {
        self.engine
            .query_partition(&self.table, user_id)
            .await?
            .into_iter()
            .map(from_item)
            .collect()
    }

    /// Last writer wins; there is no version check.
    pub async fn update_todo_done(
        &self,
        user_id: &str,
        todo_id: &str,
        done: bool,
    ) -> Result<(), StoreError> {
        let mut changes = Item::new();
        changes.insert("done".to_string(), Value::Bool(done));
        changes.insert(
            "updatedAt".to_string(),
            Value::from(Utc::now().timestamp_millis()),
        );

        self.engine
            .update_item(&self.table, &Key::composite(user_id, todo_id), changes)
            .await
    }

    pub async fn delete_todo(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        self.engine
            .delete_item(&self.table, &Key::composite(user_id, todo_id))
            .await
    }
}
