//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `BadRequest` get dedicated variants because callers react
//! to them differently from an unexpected status. The `Display` output is
//! what the client state records in its error slot, so it stays short and
//! human-readable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the input (400). Carries the server's message.
    #[error("{0}")]
    BadRequest(String),

    /// The server returned 404: the todo does not exist.
    #[error("todo not found")]
    NotFound,

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    TransportError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}
