// src/store/dynamo.rs
//! DynamoDB-backed engine
//!
//! The create-once guarantee comes from `PutItem` with an
//! `attribute_not_exists` condition on the partition key, evaluated by
//! DynamoDB atomically with the write.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::{Engine, Item, Key, StoreError, Table};

type AttributeMap = HashMap<String, AttributeValue>;

#[derive(Debug, Clone)]
pub struct DynamoEngine {
    client: Client,
}

impl DynamoEngine {
    /// Builds a client from the default AWS credential chain for `region`.
    pub async fn connect(region: &str) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        info!(region = %region, "DynamoDB client initialized");
        Self {
            client: Client::new(&aws_config),
        }
    }
}

fn key_map(table: &Table, key: &Key) -> Result<AttributeMap, StoreError> {
    let mut map = HashMap::new();
    map.insert(
        table.partition_key.to_string(),
        AttributeValue::S(key.partition.clone()),
    );
    match (table.sort_key, &key.sort) {
        (Some(name), Some(value)) => {
            map.insert(name.to_string(), AttributeValue::S(value.clone()));
        }
        (Some(name), None) => return Err(StoreError::MissingKey(name.to_string())),
        (None, _) => {}
    }
    Ok(map)
}

/// Converts a JSON value to its DynamoDB attribute form
pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

/// Converts a DynamoDB attribute back to JSON.
/// Set and binary types are not produced by this service.
pub fn from_attribute(value: &AttributeValue) -> Result<Value, StoreError> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(from_attribute)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::M(fields) => Value::Object(from_attribute_map(fields)?),
        other => {
            return Err(StoreError::Dynamo(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    })
}

fn parse_number(raw: &str) -> Result<Number, StoreError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Number::from(i));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| StoreError::Dynamo(format!("invalid number attribute: {}", raw)))
}

fn to_attribute_map(item: &Item) -> AttributeMap {
    item.iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

fn from_attribute_map(map: &AttributeMap) -> Result<Item, StoreError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
        .collect()
}

#[async_trait]
impl Engine for DynamoEngine {
    async fn get_item(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&table.name)
            .set_key(Some(key_map(table, key)?))
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), table = %table.name, "GetItem failed");
                StoreError::Dynamo(DisplayErrorContext(&e).to_string())
            })?;

        output.item.as_ref().map(from_attribute_map).transpose()
    }

    async fn put_item(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        table.key_of(&item)?;

        self.client
            .put_item()
            .table_name(&table.name)
            .set_item(Some(to_attribute_map(&item)))
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), table = %table.name, "PutItem failed");
                StoreError::Dynamo(DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }

    async fn put_item_if_absent(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;

        // The partition key exists on every stored item, so its absence means
        // no item occupies this full primary key.
        let result = self
            .client
            .put_item()
            .table_name(&table.name)
            .set_item(Some(to_attribute_map(&item)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", table.partition_key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                debug!(
                    table = %table.name,
                    partition = %key.partition,
                    sort = ?key.sort,
                    "Conditional put rejected, key already present"
                );
                Err(StoreError::AlreadyExists)
            }
            Err(e) => {
                error!(error = %DisplayErrorContext(&e), table = %table.name, "Conditional PutItem failed");
                Err(StoreError::Dynamo(DisplayErrorContext(&e).to_string()))
            }
        }
    }

    async fn update_item(&self, table: &Table, key: &Key, changes: Item) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut request = self
            .client
            .update_item()
            .table_name(&table.name)
            .set_key(Some(key_map(table, key)?))
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", table.partition_key);

        let mut assignments = Vec::with_capacity(changes.len());
        for (i, (field, value)) in changes.iter().enumerate() {
            let name = format!("#f{}", i);
            let placeholder = format!(":v{}", i);
            assignments.push(format!("{} = {}", name, placeholder));
            request = request
                .expression_attribute_names(name, field)
                .expression_attribute_values(placeholder, to_attribute(value));
        }

        let result = request
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(StoreError::NotFound)
            }
            Err(e) => {
                error!(error = %DisplayErrorContext(&e), table = %table.name, "UpdateItem failed");
                Err(StoreError::Dynamo(DisplayErrorContext(&e).to_string()))
            }
        }
    }

    async fn delete_item(&self, table: &Table, key: &Key) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&table.name)
            .set_key(Some(key_map(table, key)?))
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), table = %table.name, "DeleteItem failed");
                StoreError::Dynamo(DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }

    async fn query_partition(
        &self,
        table: &Table,
        partition: &str,
    ) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut start_key: Option<AttributeMap> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&table.name)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", table.partition_key)
                .expression_attribute_values(":pk", AttributeValue::S(partition.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    error!(error = %DisplayErrorContext(&e), table = %table.name, "Query failed");
                    StoreError::Dynamo(DisplayErrorContext(&e).to_string())
                })?;

            for raw in output.items.unwrap_or_default() {
                items.push(from_attribute_map(&raw)?);
            }

            match output.last_evaluated_key {
                Some(next) if !next.is_empty() => start_key = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }
}
