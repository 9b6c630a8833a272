// src/store/sqlite.rs
//! SQLite-backed engine
//!
//! Every logical table lives in one `kv_items` table keyed by
//! `(table_name, partition_key, sort_key)`, with the item stored as JSON text.
//! Tables without a sort key use the empty string.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

use super::{Engine, Item, Key, StoreError, Table};

#[derive(Debug, Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl SqliteEngine {
    /// Opens (creating if needed) the database and applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let connect_options =
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(connect_options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

/// Creates the item table if it does not exist yet
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_items (
            table_name TEXT NOT NULL,
            partition_key TEXT NOT NULL,
            sort_key TEXT NOT NULL DEFAULT '',
            item TEXT NOT NULL,
            PRIMARY KEY (table_name, partition_key, sort_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("kv_items table ready");
    Ok(())
}

fn sort_value(key: &Key) -> &str {
    key.sort.as_deref().unwrap_or("")
}

#[async_trait]
impl Engine for SqliteEngine {
    async fn get_item(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError> {
        let row: Option<String> = sqlx::query_scalar(
            "SELECT item FROM kv_items WHERE table_name = ? AND partition_key = ? AND sort_key = ?",
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(sort_value(key))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;
        let raw = serde_json::to_string(&item)?;

        sqlx::query(
            r#"
            INSERT INTO kv_items (table_name, partition_key, sort_key, item)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(table_name, partition_key, sort_key) DO UPDATE SET
                item = excluded.item
            "#,
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(sort_value(&key))
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put_item_if_absent(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;
        let raw = serde_json::to_string(&item)?;

        let result = sqlx::query(
            r#"
            INSERT INTO kv_items (table_name, partition_key, sort_key, item)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(table_name, partition_key, sort_key) DO NOTHING
            "#,
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(sort_value(&key))
        .bind(raw)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                table = %table.name,
                partition = %key.partition,
                sort = ?key.sort,
                "Conditional insert rejected, key already present"
            );
            return Err(StoreError::AlreadyExists);
        }

        Ok(())
    }

    async fn update_item(&self, table: &Table, key: &Key, changes: Item) -> Result<(), StoreError> {
        let patch = serde_json::to_string(&changes)?;

        let result = sqlx::query(
            r#"
            UPDATE kv_items SET item = json_patch(item, ?)
            WHERE table_name = ? AND partition_key = ? AND sort_key = ?
            "#,
        )
        .bind(patch)
        .bind(&table.name)
        .bind(&key.partition)
        .bind(sort_value(key))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_item(&self, table: &Table, key: &Key) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM kv_items WHERE table_name = ? AND partition_key = ? AND sort_key = ?",
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(sort_value(key))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_partition(
        &self,
        table: &Table,
        partition: &str,
    ) -> Result<Vec<Item>, StoreError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT item FROM kv_items WHERE table_name = ? AND partition_key = ?",
        )
        .bind(&table.name)
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|raw| serde_json::from_str(raw).map_err(StoreError::from))
            .collect()
    }
}
