use axum::http::{self, Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use todo_server::model::{NewTodo, TodoChanges};
use todo_server::{app, AppState, StoreError, Todo, TodoBackend, TodoStore};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["error"].as_str().unwrap().to_string()
}

// --- health / status ---

#[tokio::test]
async fn health_reports_service_and_version() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "todo-server");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn status_reports_environment() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/status"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["environment"], "development");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/applications"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Route /api/applications not found");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/todos"))
        .await
        .unwrap();

    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["x-dns-prefetch-control"], "off");
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/todos"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request(
            "POST",
            "/api/todos",
            r#"{"title":"  Buy milk ","description":" 2 litres "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.description, "2 litres");
    assert!(!todo.completed);
    assert_eq!(todo.created_at, todo.updated_at);
}

#[tokio::test]
async fn create_todo_ignores_client_completed() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request(
            "POST",
            "/api/todos",
            r#"{"title":"Already done","completed":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert!(!todo.completed);
}

#[tokio::test]
async fn create_todo_without_title_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("POST", "/api/todos", r#"{"description":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Title is required");
}

#[tokio::test]
async fn create_todo_blank_title_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_todo_malformed_json_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["error"].is_string());
}

// --- get ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/todos/99"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(resp).await, "Todo not found");
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("GET", "/api/todos/not-a-number"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update ---

#[tokio::test]
async fn update_todo_not_found() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("PUT", "/api/todos/99", r#"{"title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_no_fields_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("PUT", "/api/todos/1", r#"{}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "No fields to update");
}

#[tokio::test]
async fn update_with_empty_title_returns_400() {
    let resp = app(AppState::in_memory())
        .oneshot(json_request("PUT", "/api/todos/1", r#"{"title":""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Title cannot be empty");
}

#[tokio::test]
async fn update_with_null_completed_marks_pending() {
    let app = app(AppState::in_memory());
    app.clone()
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"Buy milk"}"#))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request("PUT", "/api/todos/1", r#"{"completed":true}"#))
        .await
        .unwrap();

    let resp = app
        .oneshot(json_request("PUT", "/api/todos/1", r#"{"completed":null}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todo: Todo = body_json(resp).await;
    assert!(!todo.completed);
    assert_eq!(todo.title, "Buy milk");
}

// --- delete ---

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app(AppState::in_memory())
        .oneshot(empty_request("DELETE", "/api/todos/99"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- persistence failures ---

/// Backend whose every call fails as if the pool were gone.
struct BrokenBackend;

impl TodoBackend for BrokenBackend {
    async fn insert(&self, _: NewTodo, _: DateTime<Utc>) -> Result<Todo, StoreError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn fetch_all(&self) -> Result<Vec<Todo>, StoreError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn fetch(&self, _: i64) -> Result<Option<Todo>, StoreError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn apply(
        &self,
        _: i64,
        _: TodoChanges,
        _: DateTime<Utc>,
    ) -> Result<Option<Todo>, StoreError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn remove(&self, _: i64) -> Result<bool, StoreError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn persistence_failure_returns_generic_500() {
    let state = AppState::new(TodoStore::new(BrokenBackend), "test");

    let resp = app(state.clone())
        .oneshot(empty_request("GET", "/api/todos"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(resp).await, "Failed to fetch todos");

    let resp = app(state)
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(resp).await, "Failed to create todo");
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app(AppState::in_memory()).into_service();

    // create two; the second is newer
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/todos", r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let walk: Todo = body_json(resp).await;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/todos", r#"{"title":"Buy milk"}"#))
        .await
        .unwrap();
    let milk: Todo = body_json(resp).await;

    // list: newest first
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/todos"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    let ids: Vec<i64> = todos.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![milk.id, walk.id]);

    // update: partial: only completed
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/api/todos/{}", milk.id),
            r#"{"completed":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Buy milk"); // unchanged
    assert!(updated.completed);
    assert!(updated.updated_at >= milk.updated_at);

    // toggle: flips back
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("POST", &format!("/api/todos/{}/toggle", milk.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let toggled: Todo = body_json(resp).await;
    assert!(!toggled.completed);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/api/todos/{}", milk.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // delete again: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/api/todos/{}", milk.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete: only the first remains
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/todos"))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, walk.id);
}
