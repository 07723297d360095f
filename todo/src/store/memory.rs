use super::TodoStore;
use crate::errors::Result;
use crate::item::TodoItem;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-local table. Scans come back ordered by id.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, TodoItem>>,
}

impl MemoryStore {
    fn items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, TodoItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, item: &TodoItem) -> Result<()> {
        self.items().insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TodoItem>> {
        Ok(self.items().get(id).cloned())
    }

    async fn scan(&self) -> Result<Vec<TodoItem>> {
        Ok(self.items().values().cloned().collect())
    }

    async fn update(&self, id: &str, task: &str, done: bool) -> Result<()> {
        let mut items = self.items();
        let item = items.entry(id.to_string()).or_insert_with(|| TodoItem {
            id: id.to_string(),
            task: String::new(),
            created_at: None,
            ttl: None,
            done: false,
        });
        item.task = task.to_string();
        item.done = done;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.items().remove(id);
        Ok(())
    }
}
