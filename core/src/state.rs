//! Client-side mirror of the server's todo collection.
//!
//! # Design
//! `TodoState` is a cheap-to-clone handle over shared state, built
//! explicitly from a `TodoClient` and a `Transport`. Every mutation waits
//! for the server and reconciles the cache with the record the server
//! returned; nothing is synthesized locally. Locks are never held across a
//! network call, so overlapping operations are allowed and the response that
//! lands last wins, as on the server.
//!
//! Errors land in a single "last error" slot. Mutations also return the
//! error to the caller; `fetch_all` does not, since nobody awaits the
//! initial load.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::highlight::Highlighter;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{CreateTodo, Todo, TodoPatch};
use crate::view::{partition, TodoView};

#[derive(Debug, Default)]
struct Cache {
    todos: Vec<Todo>,
    error: Option<String>,
    /// `fetch_all` calls in flight.
    fetches: usize,
}

struct Shared<T> {
    client: TodoClient,
    transport: T,
    cache: RwLock<Cache>,
    highlighter: Highlighter,
}

pub struct TodoState<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TodoState<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> TodoState<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self::with_highlighter(client, transport, Highlighter::default())
    }

    pub fn with_highlight_window(client: TodoClient, transport: T, window: Duration) -> Self {
        Self::with_highlighter(client, transport, Highlighter::new(window))
    }

    fn with_highlighter(client: TodoClient, transport: T, highlighter: Highlighter) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                transport,
                cache: RwLock::new(Cache::default()),
                highlighter,
            }),
        }
    }

    fn client(&self) -> &TodoClient {
        &self.shared.client
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        Ok(self.shared.transport.execute(request).await?)
    }

    /// Replace the cache with the server's list. Failures are recorded in
    /// the error slot only.
    pub async fn fetch_all(&self) {
        self.shared.cache.write().await.fetches += 1;

        let result = match self.send(self.client().build_list_todos()).await {
            Ok(response) => self.client().parse_list_todos(response),
            Err(err) => Err(err),
        };

        let mut cache = self.shared.cache.write().await;
        cache.fetches -= 1;
        match result {
            Ok(todos) => {
                tracing::debug!(count = todos.len(), "fetched todos");
                cache.todos = todos;
                cache.error = None;
                self.shared
                    .highlighter
                    .observe(cache.todos.iter().map(|t| t.id))
                    .await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch todos");
                cache.error = Some(format!("Failed to fetch todos: {err}"));
            }
        }
    }

    /// Create a todo and append the server's record to the cache.
    pub async fn add(&self, title: &str, description: Option<&str>) -> Result<Todo, ApiError> {
        let input = CreateTodo {
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        let result = match self.client().build_create_todo(&input) {
            Ok(request) => match self.send(request).await {
                Ok(response) => self.client().parse_create_todo(response),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.settle(result, "Failed to add todo", |todos, todo: &Todo| {
            todos.push(todo.clone());
        })
        .await
    }

    /// Send `patch` and replace the cached record with the server's copy.
    pub async fn update(&self, id: i64, patch: &TodoPatch) -> Result<Todo, ApiError> {
        let result = self.send_update(id, patch).await;
        self.settle(result, "Failed to update todo", replace).await
    }

    /// Flip `completed` of the cached record with a plain update. An id
    /// missing from the cache fails as `NotFound` without a request.
    pub async fn toggle(&self, id: i64) -> Result<Todo, ApiError> {
        let cached = {
            let cache = self.shared.cache.read().await;
            cache.todos.iter().find(|t| t.id == id).map(|t| t.completed)
        };
        let result = match cached {
            Some(completed) => self.send_update(id, &TodoPatch::completed(!completed)).await,
            None => Err(ApiError::NotFound),
        };
        self.settle(result, "Failed to toggle todo", replace).await
    }

    async fn send_update(&self, id: i64, patch: &TodoPatch) -> Result<Todo, ApiError> {
        let request = self.client().build_update_todo(id, patch)?;
        let response = self.send(request).await?;
        self.client().parse_update_todo(response)
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let result = match self.send(self.client().build_delete_todo(id)).await {
            Ok(response) => self.client().parse_delete_todo(response),
            Err(err) => Err(err),
        };
        self.settle(result, "Failed to delete todo", |todos, _: &()| {
            todos.retain(|t| t.id != id);
        })
        .await
    }

    /// Apply a confirmed result to the cache, or record the failure and
    /// hand it back unchanged.
    async fn settle<R>(
        &self,
        result: Result<R, ApiError>,
        failure: &str,
        apply: impl FnOnce(&mut Vec<Todo>, &R),
    ) -> Result<R, ApiError> {
        let mut cache = self.shared.cache.write().await;
        match result {
            Ok(value) => {
                apply(&mut cache.todos, &value);
                cache.error = None;
                self.shared
                    .highlighter
                    .observe(cache.todos.iter().map(|t| t.id))
                    .await;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, "{failure}");
                cache.error = Some(format!("{failure}: {err}"));
                Err(err)
            }
        }
    }

    /// The cached collection in server order for the last fetch, with
    /// additions appended.
    pub async fn todos(&self) -> Vec<Todo> {
        self.shared.cache.read().await.todos.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.shared.cache.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.shared.cache.read().await.fetches > 0
    }

    pub async fn highlighted(&self) -> HashSet<i64> {
        self.shared.highlighter.highlighted().await
    }

    pub async fn view(&self) -> TodoView {
        let cache = self.shared.cache.read().await;
        let highlighted = self.shared.highlighter.highlighted().await;
        let (pending, completed) = partition(&cache.todos, &highlighted);
        TodoView {
            pending,
            completed,
            error: cache.error.clone(),
            loading: cache.fetches > 0,
        }
    }
}

fn replace(todos: &mut Vec<Todo>, updated: &Todo) {
    if let Some(slot) = todos.iter_mut().find(|t| t.id == updated.id) {
        *slot = updated.clone();
    }
}
