// src/store/mod.rs
//! Key-value persistence engine boundary
//!
//! Stores talk to an [`Engine`], which exposes get/put/update/delete by
//! composite key, an atomic put-if-absent and a partition query. Items are
//! JSON objects whose key attributes are named by the [`Table`].

pub mod dynamo;
pub mod sqlite;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use dynamo::DynamoEngine;
pub use sqlite::SqliteEngine;

/// A stored item: attribute name to JSON value
pub type Item = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional write found an item under the same key
    #[error("item already exists")]
    AlreadyExists,

    #[error("item not found")]
    NotFound,

    #[error("item is missing key attribute {0}")]
    MissingKey(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("DynamoDB error: {0}")]
    Dynamo(String),
}

/// Table name plus the attribute names that form the primary key
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub partition_key: &'static str,
    pub sort_key: Option<&'static str>,
}

impl Table {
    pub fn new(name: impl Into<String>, partition_key: &'static str) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: &'static str) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    /// Reads the key values out of an item.
    pub fn key_of(&self, item: &Item) -> Result<Key, StoreError> {
        let partition = string_attr(item, self.partition_key)?;
        let sort = match self.sort_key {
            Some(name) => Some(string_attr(item, name)?),
            None => None,
        };
        Ok(Key { partition, sort })
    }
}

fn string_attr(item: &Item, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::MissingKey(name.to_string()))
}

/// Serializes a record into an item; fails for values that are not objects.
pub fn to_item<T: Serialize>(value: &T) -> Result<Item, StoreError> {
    Ok(serde_json::from_value(serde_json::to_value(value)?)?)
}

pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(item))?)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub partition: String,
    pub sort: Option<String>,
}

impl Key {
    pub fn partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: None,
        }
    }

    pub fn composite(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: Some(sort.into()),
        }
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    async fn get_item(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError>;

    /// Unconditional write, replacing any item under the same key.
    async fn put_item(&self, table: &Table, item: Item) -> Result<(), StoreError>;

    /// Writes the item only if no item exists under its key. The check and the
    /// write are a single atomic operation inside the engine; a violated
    /// precondition yields [`StoreError::AlreadyExists`].
    async fn put_item_if_absent(&self, table: &Table, item: Item) -> Result<(), StoreError>;

    /// Sets `changes` on an existing item. Never creates an item; a missing
    /// key yields [`StoreError::NotFound`].
    async fn update_item(&self, table: &Table, key: &Key, changes: Item) -> Result<(), StoreError>;

    /// Removes the item. Deleting a missing key succeeds.
    async fn delete_item(&self, table: &Table, key: &Key) -> Result<(), StoreError>;

    /// All items sharing the partition key, in engine order.
    async fn query_partition(&self, table: &Table, partition: &str)
        -> Result<Vec<Item>, StoreError>;
}
