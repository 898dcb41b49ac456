//! Database primitives for the relational half of the portal.
//!
//! Requisitions, suppliers and inventory live behind sea-orm; the rest of
//! the HR data sits in the in-memory store of `products-hr`.

pub mod inventory;
pub mod requisitions;
mod seed;
pub mod suppliers;

use std::time::Duration;

use platform_api::ApiError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use serde::Deserialize;
use thiserror::Error;

pub use seed::seed_demo;

/// Shared connection alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("{entity} {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("requisition {id} is already {status}")]
    AlreadyDecided { id: i32, status: &'static str },
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Db(err) => ApiError::internal(anyhow::Error::new(err)),
            DbError::NotFound { .. } => ApiError::not_found(value.to_string()),
            DbError::Invalid(msg) => ApiError::InvalidInput(msg),
            DbError::Duplicate(msg) => ApiError::Conflict(msg),
            DbError::AlreadyDecided { .. } => ApiError::conflict(value.to_string()),
        }
    }
}

/// Environment-driven connection settings.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            max_connections: None,
        }
    }
}

impl DatabaseSettings {
    pub const DEFAULT_URL: &'static str = "sqlite://portal.db?mode=rwc";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: None,
        }
    }

    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_URL.to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.trim().parse().ok());
        Self {
            url,
            max_connections,
        }
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(max) = settings.max_connections {
        options.max_connections(max);
    }
    let pool = Database::connect(options).await?;
    tracing::info!(backend = ?pool.get_database_backend(), "database connected");
    Ok(pool)
}

pub async fn ping(pool: &DbPool) -> bool {
    let backend = pool.get_database_backend();
    pool.execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok()
}

#[cfg(test)]
pub(crate) mod testing {
    use migration::{Migrator, MigratorTrait};

    use super::{DatabaseSettings, DbPool, connect};

    pub async fn memory_pool() -> DbPool {
        let mut settings = DatabaseSettings::new("sqlite::memory:");
        settings.max_connections = Some(1);
        let pool = connect(&settings).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        pool
    }
}
