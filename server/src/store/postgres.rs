//! Postgres backend over a `sqlx` connection pool.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::TodoBackend;
use crate::config::{ConfigError, DatabaseConfig};
use crate::error::StoreError;
use crate::model::{NewTodo, Todo, TodoChanges};

const COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to postgres: {0}")]
    Database(#[from] sqlx::Error),
}

impl PostgresBackend {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await?;
        tracing::info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Create the `todos` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS todos (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL CHECK (btrim(title) <> ''),
                description TEXT NOT NULL DEFAULT '',
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl TodoBackend for PostgresBackend {
    async fn insert(&self, todo: NewTodo, now: DateTime<Utc>) -> Result<Todo, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (title, description, completed, created_at, updated_at) \
             VALUES ($1, $2, FALSE, $3, $3) RETURNING {COLUMNS}"
        ))
        .bind(todo.title)
        .bind(todo.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn fetch_all(&self) -> Result<Vec<Todo>, StoreError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(&format!("SELECT {COLUMNS} FROM todos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn apply(
        &self,
        id: i64,
        changes: TodoChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET \
                title = COALESCE($1, title), \
                description = COALESCE($2, description), \
                completed = COALESCE($3, completed), \
                updated_at = GREATEST($4, created_at) \
             WHERE id = $5 RETURNING {COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.completed)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
