//! REST surface over `TodoStore`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::extract::{JsonBody, TodoId};
use crate::model::{CreateTodo, Todo, TodoPatch};
use crate::store::{MemoryBackend, TodoBackend, TodoStore};

pub const SERVICE_NAME: &str = "todo-server";

/// Hardening headers added to every response unless a handler set them.
const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
];

pub struct AppState<B> {
    pub store: Arc<TodoStore<B>>,
    pub environment: Arc<str>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<B: TodoBackend> AppState<B> {
    pub fn new(store: TodoStore<B>, environment: &str) -> Self {
        Self {
            store: Arc::new(store),
            environment: Arc::from(environment),
        }
    }
}

impl AppState<MemoryBackend> {
    pub fn in_memory() -> Self {
        Self::new(TodoStore::new(MemoryBackend::new()), "development")
    }
}

pub fn app<B: TodoBackend>(state: AppState<B>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status::<B>))
        .route("/api/todos", get(list_todos::<B>).post(create_todo::<B>))
        .route(
            "/api/todos/{id}",
            get(get_todo::<B>).put(update_todo::<B>).delete(delete_todo::<B>),
        )
        .route("/api/todos/{id}/toggle", post(toggle_todo::<B>))
        .fallback(not_found);

    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: timestamp(),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn status<B: TodoBackend>(State(state): State<AppState<B>>) -> Json<Value> {
    Json(json!({
        "message": "Todo API is running",
        "environment": &*state.environment,
        "timestamp": timestamp(),
    }))
}

async fn list_todos<B: TodoBackend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state
        .store
        .list()
        .await
        .map_err(ApiError::from_store("Failed to fetch todos"))?;
    Ok(Json(todos))
}

async fn create_todo<B: TodoBackend>(
    State(state): State<AppState<B>>,
    JsonBody(input): JsonBody<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state
        .store
        .create(input)
        .await
        .map_err(ApiError::from_store("Failed to create todo"))?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo<B: TodoBackend>(
    State(state): State<AppState<B>>,
    TodoId(id): TodoId,
) -> Result<Json<Todo>, ApiError> {
    let todo = state
        .store
        .get(id)
        .await
        .map_err(ApiError::from_store("Failed to fetch todo"))?;
    Ok(Json(todo))
}

async fn update_todo<B: TodoBackend>(
    State(state): State<AppState<B>>,
    TodoId(id): TodoId,
    JsonBody(patch): JsonBody<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state
        .store
        .update(id, patch)
        .await
        .map_err(ApiError::from_store("Failed to update todo"))?;
    Ok(Json(todo))
}

async fn toggle_todo<B: TodoBackend>(
    State(state): State<AppState<B>>,
    TodoId(id): TodoId,
) -> Result<Json<Todo>, ApiError> {
    let todo = state
        .store
        .toggle(id)
        .await
        .map_err(ApiError::from_store("Failed to toggle todo"))?;
    Ok(Json(todo))
}

async fn delete_todo<B: TodoBackend>(
    State(state): State<AppState<B>>,
    TodoId(id): TodoId,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete(id)
        .await
        .map_err(ApiError::from_store("Failed to delete todo"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Route {uri} not found"),
        })),
    )
}
