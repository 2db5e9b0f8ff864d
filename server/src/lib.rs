//! Todo REST service.
//!
//! # Overview
//! `TodoStore` is the source of truth for todo records: it validates input,
//! stamps `created_at`/`updated_at` and hands persistence to a
//! `TodoBackend` (in-memory or Postgres). `routes::app` exposes the store as
//! JSON over HTTP under `/api/todos`, plus `/health` and `/api/status`.
//!
//! # Design
//! - The store is built explicitly and injected into the router state, so
//!   tests run the full HTTP surface against `MemoryBackend`.
//! - `TodoPatch` keeps "field omitted" apart from "field present", which is
//!   what partial updates depend on.
//! - `StoreError` maps onto 400 / 404 / 500 in one place (`ApiError`).

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod routes;
pub mod store;

use tokio::net::TcpListener;

pub use config::{Config, StoreKind};
pub use error::{ApiError, StoreError};
pub use model::{CreateTodo, Todo, TodoPatch};
pub use routes::{app, AppState};
pub use store::{MemoryBackend, PostgresBackend, TodoBackend, TodoStore};

/// Serve `state` on `listener` until the process receives Ctrl-C, then close
/// the store.
pub async fn run<B: TodoBackend>(listener: TcpListener, state: AppState<B>) -> Result<(), std::io::Error> {
    let store = state.store.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    store.close().await;
    tracing::info!("store closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
