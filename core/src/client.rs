//! Stateless request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`, so the I/O boundary stays explicit and
//! the client is deterministic under test.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Health, Todo, TodoPatch};

#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    fn todo_url(&self, id: i64) -> String {
        format!("{}/api/todos/{id}", self.base_url)
    }

    fn bare(method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn json<T: serde::Serialize>(
        method: HttpMethod,
        path: String,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_health(&self) -> HttpRequest {
        Self::bare(HttpMethod::Get, format!("{}/health", self.base_url))
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        Self::bare(HttpMethod::Get, self.todos_url())
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        Self::bare(HttpMethod::Get, self.todo_url(id))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Self::json(HttpMethod::Post, self.todos_url(), input)
    }

    pub fn build_update_todo(&self, id: i64, patch: &TodoPatch) -> Result<HttpRequest, ApiError> {
        Self::json(HttpMethod::Put, self.todo_url(id), patch)
    }

    pub fn build_toggle_todo(&self, id: i64) -> HttpRequest {
        Self::bare(HttpMethod::Post, format!("{}/toggle", self.todo_url(id)))
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        Self::bare(HttpMethod::Delete, self.todo_url(id))
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<Health, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_toggle_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the matching `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        status if status == expected => Ok(()),
        400 => Err(ApiError::BadRequest(error_message(&response.body))),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            message: error_message(&response.body),
        }),
    }
}

/// The server's `{"error": "..."}` message, or the raw body when it is not
/// shaped that way.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
