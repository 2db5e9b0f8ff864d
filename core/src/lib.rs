//! Client core for the todo service.
//!
//! # Overview
//! Two layers:
//! - `TodoClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO). A `Transport`
//!   performs the round trip; `ReqwestTransport` is the stock one.
//! - `TodoState` keeps an in-memory mirror of the server's collection,
//!   reconciles it with every server response, records the last error and
//!   exposes a pending/completed `TodoView` with newly added todos
//!   highlighted for `HIGHLIGHT_WINDOW`.
//!
//! # Design
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.
//! - The server is authoritative: the state never assumes a mutation
//!   succeeded before the server confirms it.

pub mod client;
pub mod error;
pub mod highlight;
pub mod http;
pub mod state;
pub mod transport;
pub mod types;
pub mod view;

pub use client::TodoClient;
pub use error::ApiError;
pub use highlight::{Highlighter, HIGHLIGHT_WINDOW};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::TodoState;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{Transport, TransportError};
pub use types::{CreateTodo, Health, Todo, TodoPatch};
pub use view::{TodoEntry, TodoView};
