//! Store errors and their HTTP rendering.
//!
//! # Design
//! `StoreError` is the store's taxonomy and knows nothing about HTTP.
//! `ApiError` is what handlers return: it carries the status and the message
//! the client sees. Persistence failures are logged with their cause and
//! reach the client only as a generic per-operation message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad or missing input: blank title, empty patch.
    #[error("{0}")]
    Validation(String),

    #[error("todo {0} not found")]
    NotFound(i64),

    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a store error, using `failure` as the client-facing message for
    /// persistence errors.
    pub fn from_store(failure: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |err| match err {
            StoreError::Validation(message) => {
                tracing::warn!(%message, "rejected invalid todo request");
                Self::bad_request(message)
            }
            StoreError::NotFound(id) => {
                tracing::warn!(id, "todo not found");
                Self::new(StatusCode::NOT_FOUND, "Todo not found")
            }
            StoreError::Persistence(source) => {
                tracing::error!(error = %source, "{failure}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
