//! Process configuration read from the environment.
//!
//! Every setting has a default so `todo-server` starts with no environment
//! at all, backed by the in-memory store.

use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be `memory` or `postgres`, got {value:?}")]
    InvalidStore { key: &'static str, value: String },

    #[error("invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// `DATABASE_URL` wins over the individual `DB_*` settings.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match &self.url {
            Some(url) => url.parse().map_err(ConfigError::InvalidDatabaseUrl),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .database(&self.name)
                .username(&self.user)
                .password(&self.password)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub store: StoreKind,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let url = lookup("DATABASE_URL");
        let store = match lookup("TODO_STORE") {
            Some(value) => match value.as_str() {
                "memory" => StoreKind::Memory,
                "postgres" => StoreKind::Postgres,
                _ => {
                    return Err(ConfigError::InvalidStore {
                        key: "TODO_STORE",
                        value,
                    })
                }
            },
            None if url.is_some() || lookup("DB_HOST").is_some() => StoreKind::Postgres,
            None => StoreKind::Memory,
        };

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port: number(&lookup, "PORT", 3001)?,
            environment: get("APP_ENV", "development"),
            store,
            database: DatabaseConfig {
                url,
                host: get("DB_HOST", "localhost"),
                port: number(&lookup, "DB_PORT", 5432)?,
                name: get("DB_NAME", "todo_db"),
                user: get("DB_USER", "todo_user"),
                password: get("DB_PASSWORD", "todo_password"),
                max_connections: number(&lookup, "DB_MAX_CONNECTIONS", 20)?,
                idle_timeout: Duration::from_secs(30),
                acquire_timeout: Duration::from_secs(2),
            },
        })
    }

    /// Host and port for `TcpListener::bind`; the host may be a name.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}
