// ABOUTME: Database connection management and shared storage errors
// ABOUTME: Provides the SQLite pool, pragmas, and embedded migrations for all RFP Desk packages

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use rfpdesk_core::ValidationError;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: &'static str, id: String },
    #[error("Duplicate {entity}: {value}")]
    Duplicate { entity: &'static str, value: String },
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            id: id.into(),
        }
    }

    /// Map a unique-constraint violation to `Duplicate`, pass everything else through
    pub fn from_insert(err: sqlx::Error, entity: &'static str, value: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate {
                entity,
                value: value.to_string(),
            },
            _ => Self::Sqlx(err),
        }
    }

    /// True for failures of the store itself rather than of the request
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Database(_) | Self::Migration(_) | Self::Sqlx(_) | Self::Json(_)
        )
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

/// Connect to a database URL, configure SQLite, and run migrations
pub async fn connect(database_url: &str, config: &PoolConfig) -> StorageResult<SqlitePool> {
    debug!("Connecting to database: {}", database_url);

    let in_memory = database_url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout)
        .synchronous(SqliteSynchronous::Normal);

    // WAL is meaningless for in-memory databases
    let options = if in_memory {
        options
    } else {
        options.journal_mode(SqliteJournalMode::Wal)
    };

    // Every connection to `:memory:` is its own database, so keep exactly one
    // connection alive for the lifetime of the pool
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    info!("Database connection established");

    MIGRATOR.run(&pool).await?;

    debug!("Database migrations completed");

    Ok(pool)
}

/// Connect to a database file, creating the parent directory if needed
pub async fn connect_file(path: &Path, config: &PoolConfig) -> StorageResult<SqlitePool> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    connect(&format!("sqlite:{}", path.display()), config).await
}

/// Fresh, migrated in-memory database
pub async fn in_memory_pool() -> StorageResult<SqlitePool> {
    connect("sqlite::memory:", &PoolConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_runs_migrations() {
        let pool = in_memory_pool().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '_sqlx%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "activity_logs",
            "companies",
            "notifications",
            "rfps",
            "sessions",
            "stage_tasks",
            "supplier_contacts",
            "supplier_responses",
            "timeline_events",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = in_memory_pool().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_connect_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rfpdesk.db");

        let pool = connect_file(&path, &PoolConfig::default()).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(StorageError::Database("down".into()).is_infrastructure());
        assert!(!StorageError::not_found("rfp", "rfp-1").is_infrastructure());
        assert!(!StorageError::conflict("rfp", "rfp-1").is_infrastructure());
    }
}
