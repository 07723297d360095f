use super::TodoStore;
use crate::errors::{Result, TodoError};
use crate::item::TodoItem;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

type Attributes = HashMap<String, AttributeValue>;

pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        DynamoDbStore {
            client,
            table_name: table_name.into(),
        }
    }
}

fn store_error<E: std::error::Error>(operation: &'static str, e: E) -> TodoError {
    TodoError::Store {
        operation,
        message: DisplayErrorContext(e).to_string(),
    }
}

fn key(id: &str) -> AttributeValue {
    AttributeValue::S(id.to_string())
}

fn to_attributes(item: &TodoItem) -> Attributes {
    let mut attributes = HashMap::from([
        ("id".to_string(), AttributeValue::S(item.id.clone())),
        ("task".to_string(), AttributeValue::S(item.task.clone())),
        ("done".to_string(), AttributeValue::Bool(item.done)),
    ]);
    if let Some(created_at) = &item.created_at {
        attributes.insert(
            "created_at".to_string(),
            AttributeValue::S(created_at.clone()),
        );
    }
    if let Some(ttl) = item.ttl {
        attributes.insert("ttl".to_string(), AttributeValue::N(ttl.to_string()));
    }
    attributes
}

fn string_attribute(attributes: &Attributes, name: &str) -> Option<String> {
    match attributes.get(name) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

/// Numbers come back as decimal strings; fractional seconds are truncated.
fn parse_epoch(number: &str) -> Result<i64> {
    number
        .parse::<i64>()
        .ok()
        .or_else(|| number.parse::<f64>().ok().map(|n| n as i64))
        .ok_or_else(|| TodoError::InvalidItem(format!("ttl is not a number: {number}")))
}

fn from_attributes(attributes: &Attributes) -> Result<TodoItem> {
    let id = string_attribute(attributes, "id")
        .ok_or_else(|| TodoError::InvalidItem("missing string id".to_string()))?;
    let ttl = match attributes.get("ttl") {
        Some(AttributeValue::N(number)) => Some(parse_epoch(number)?),
        _ => None,
    };

    Ok(TodoItem {
        id,
        task: string_attribute(attributes, "task").unwrap_or_default(),
        created_at: string_attribute(attributes, "created_at"),
        ttl,
        done: matches!(attributes.get("done"), Some(AttributeValue::Bool(true))),
    })
}

#[async_trait]
impl TodoStore for DynamoDbStore {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn put(&self, item: &TodoItem) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_attributes(item)))
            .send()
            .await
            .map_err(|e| store_error("PutItem", e))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TodoItem>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", key(id))
            .send()
            .await
            .map_err(|e| store_error("GetItem", e))?;

        output.item().map(from_attributes).transpose()
    }

    async fn scan(&self) -> Result<Vec<TodoItem>> {
        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| store_error("Scan", e))?;

            for attributes in output.items() {
                items.push(from_attributes(attributes)?);
            }
            match output.last_evaluated_key() {
                Some(last) if !last.is_empty() => start_key = Some(last.clone()),
                _ => break,
            }
        }

        tracing::info!(count = items.len(), table = %self.table_name, "Scanned table");
        Ok(items)
    }

    async fn update(&self, id: &str, task: &str, done: bool) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", key(id))
            .update_expression("SET task = :t, done = :d")
            .expression_attribute_values(":t", AttributeValue::S(task.to_string()))
            .expression_attribute_values(":d", AttributeValue::Bool(done))
            .send()
            .await
            .map_err(|e| store_error("UpdateItem", e))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", key(id))
            .send()
            .await
            .map_err(|e| store_error("DeleteItem", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_attributes() {
        let item = TodoItem {
            id: "20251026213045".into(),
            task: "buy milk".into(),
            created_at: Some("2025-10-26T21:30:45.000000Z".into()),
            ttl: Some(1761514845),
            done: false,
        };
        let attributes = to_attributes(&item);
        assert_eq!(attributes["ttl"], AttributeValue::N("1761514845".into()));
        assert_eq!(attributes["done"], AttributeValue::Bool(false));
        assert_eq!(from_attributes(&attributes).unwrap(), item);
    }

    #[test]
    fn test_updated_only_item() {
        let attributes = HashMap::from([
            ("id".to_string(), key("x")),
            ("task".to_string(), AttributeValue::S("t".into())),
            ("done".to_string(), AttributeValue::Bool(true)),
        ]);
        let item = from_attributes(&attributes).unwrap();
        assert_eq!(item.created_at, None);
        assert_eq!(item.ttl, None);
        assert!(item.done);
    }

    #[test]
    fn test_decimal_ttl_is_truncated() {
        assert_eq!(parse_epoch("1761514845.75").unwrap(), 1761514845);
        assert!(matches!(
            parse_epoch("soon"),
            Err(TodoError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_item_without_id_is_rejected() {
        let attributes = HashMap::from([("task".to_string(), AttributeValue::S("t".into()))]);
        assert!(matches!(
            from_attributes(&attributes),
            Err(TodoError::InvalidItem(_))
        ));
    }
}
