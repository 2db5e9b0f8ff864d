use tokio::net::TcpListener;
use todo_server::{AppState, Config, MemoryBackend, PostgresBackend, StoreKind, TodoStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, environment = %config.environment, store = ?config.store, "listening");

    match config.store {
        StoreKind::Memory => {
            let store = TodoStore::new(MemoryBackend::new());
            todo_server::run(listener, AppState::new(store, &config.environment)).await?;
        }
        StoreKind::Postgres => {
            let backend = PostgresBackend::connect(&config.database).await?;
            backend.migrate().await?;
            let store = TodoStore::new(backend);
            todo_server::run(listener, AppState::new(store, &config.environment)).await?;
        }
    }
    Ok(())
}
