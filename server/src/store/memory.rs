//! In-process backend used by tests and by the `memory` store mode.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TodoBackend;
use crate::error::StoreError;
use crate::model::{NewTodo, Todo, TodoChanges};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: HashMap<i64, Todo>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: RwLock<Table>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoBackend for MemoryBackend {
    async fn insert(&self, todo: NewTodo, now: DateTime<Utc>) -> Result<Todo, StoreError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let todo = Todo {
            id: table.last_id,
            title: todo.title,
            description: todo.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn fetch_all(&self) -> Result<Vec<Todo>, StoreError> {
        let table = self.table.read().await;
        let mut todos: Vec<Todo> = table.rows.values().cloned().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn apply(
        &self,
        id: i64,
        changes: TodoChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Todo>, StoreError> {
        let mut table = self.table.write().await;
        let Some(todo) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(todo);
        todo.updated_at = now.max(todo.created_at);
        Ok(Some(todo.clone()))
    }

    async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn close(&self) {}
}
