// src/services/users.rs
//! User profile records, one per provider subject id

use std::sync::Arc;
use tracing::debug;

use crate::auth::models::User;
use crate::store::{from_item, to_item, Engine, Key, StoreError, Table};

#[derive(Clone)]
pub struct UserStore {
    engine: Arc<dyn Engine>,
    table: Table,
}

impl UserStore {
    pub fn new(engine: Arc<dyn Engine>, table_name: impl Into<String>) -> Self {
        Self {
            engine,
            table: Table::new(table_name, "userId"),
        }
    }

    /// Overwrites the whole record; the provider profile is the source of truth.
    pub async fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        self.engine.put_item(&self.table, to_item(user)?).await?;
        debug!(user_id = %user.user_id, "User record upserted");
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let item = self
            .engine
            .get_item(&self.table, &Key::partition(user_id))
            .await?;

        match item {
            Some(map) => Ok(Some(from_item(map)?)),
            None => Ok(None),
        }
    }
}
