//! The authoritative todo store.
//!
//! # Design
//! `TodoStore` owns everything that makes a todo valid: trimming, the
//! non-empty title rule, partial-update semantics and timestamp stamping.
//! Persistence sits behind `TodoBackend`, so the same rules run against the
//! in-memory table used by tests and against Postgres in production. The
//! store is constructed explicitly and shared through an `Arc`; there is no
//! process-wide instance.

mod clock;
mod memory;
mod postgres;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{CreateTodo, NewTodo, Todo, TodoChanges, TodoPatch};

pub use clock::{Clock, SystemClock};
pub use memory::MemoryBackend;
pub use postgres::{ConnectError, PostgresBackend};

/// Persistence seam for todo records.
///
/// Backends trust their input: `NewTodo` and `TodoChanges` are validated and
/// `now` comes from the store's clock. `fetch_all` returns records ordered by
/// `created_at` descending, newest id first on ties.
pub trait TodoBackend: Send + Sync + 'static {
    fn insert(
        &self,
        todo: NewTodo,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Todo, StoreError>> + Send;

    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Todo>, StoreError>> + Send;

    fn fetch(&self, id: i64) -> impl Future<Output = Result<Option<Todo>, StoreError>> + Send;

    /// Apply `changes` and set `updated_at` to `now`, never earlier than
    /// `created_at`. Returns `None` when `id` does not exist.
    fn apply(
        &self,
        id: i64,
        changes: TodoChanges,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Todo>, StoreError>> + Send;

    /// Returns `false` when `id` does not exist.
    fn remove(&self, id: i64) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn close(&self) -> impl Future<Output = ()> + Send;
}

pub struct TodoStore<B> {
    backend: B,
    clock: Arc<dyn Clock>,
}

impl<B: TodoBackend> TodoStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// All todos, newest first.
    pub async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        self.backend.fetch_all().await
    }

    pub async fn get(&self, id: i64) -> Result<Todo, StoreError> {
        self.backend.fetch(id).await?.ok_or(StoreError::NotFound(id))
    }

    pub async fn create(&self, input: CreateTodo) -> Result<Todo, StoreError> {
        let new = validate_new(input)?;
        let todo = self.backend.insert(new, self.clock.now()).await?;
        tracing::info!(id = todo.id, title = %todo.title, "todo created");
        Ok(todo)
    }

    /// Apply the fields present in `patch`.
    ///
    /// Input is judged before existence: an empty title or an empty patch is
    /// a validation error even for an unknown id.
    pub async fn update(&self, id: i64, patch: TodoPatch) -> Result<Todo, StoreError> {
        let changes = validate_patch(patch)?;
        let todo = self
            .backend
            .apply(id, changes, self.clock.now())
            .await?
            .ok_or(StoreError::NotFound(id))?;
        tracing::info!(id, completed = todo.completed, "todo updated");
        Ok(todo)
    }

    /// Flip `completed`. Reads then writes without a lock, so two concurrent
    /// toggles may both observe the same starting value.
    pub async fn toggle(&self, id: i64) -> Result<Todo, StoreError> {
        let current = self.get(id).await?;
        self.update(id, TodoPatch::completed(!current.completed)).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !self.backend.remove(id).await? {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(id, "todo deleted");
        Ok(())
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}

fn validate_new(input: CreateTodo) -> Result<NewTodo, StoreError> {
    let title = input.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(StoreError::Validation("Title is required".to_string()));
    }
    Ok(NewTodo {
        title: title.to_string(),
        description: input
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    })
}

fn validate_patch(patch: TodoPatch) -> Result<TodoChanges, StoreError> {
    let title = match patch.title {
        Some(title) => {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(StoreError::Validation("Title cannot be empty".to_string()));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    let changes = TodoChanges {
        title,
        description: patch
            .description
            .map(|d| d.as_deref().map(str::trim).unwrap_or_default().to_string()),
        completed: patch.completed,
    };
    if changes.is_empty() {
        return Err(StoreError::Validation("No fields to update".to_string()));
    }
    Ok(changes)
}
