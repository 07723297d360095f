pub mod dynamodb;
pub mod memory;

use crate::errors::Result;
use crate::item::TodoItem;
use async_trait::async_trait;

pub use dynamodb::DynamoDbStore;
pub use memory::MemoryStore;

/// Table of todo items keyed by `id`.
#[async_trait]
pub trait TodoStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Insert or replace the whole item.
    async fn put(&self, item: &TodoItem) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<TodoItem>>;

    /// Every item in the table, in no particular order.
    async fn scan(&self) -> Result<Vec<TodoItem>>;

    /// Sets `task` and `done`, creating the item when `id` is unknown.
    async fn update(&self, id: &str, task: &str, done: bool) -> Result<()>;

    /// Removing an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}
