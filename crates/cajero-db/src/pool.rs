//! # Database Handle
//!
//! Opens the terminal's SQLite file, applies the schema and hands out the
//! four repositories the terminal works with.
//!
//! ```text
//! [database] path, max_connections ──► DbConfig
//!                                         │
//!                      Database::new ─────┤ open (WAL, foreign keys, busy timeout)
//!                                         └ migrate
//!                                         │
//!      clients() · products() · documents() · company()
//! ```
//!
//! One `cajero` process issues documents at a time per series, but `history`
//! or a second terminal may read while a document is being written; WAL keeps
//! those readers off the writer's path. The busy timeout covers two processes
//! racing for the write lock; the unique document number index settles the
//! race itself.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::client::ClientRepository;
use crate::repository::company::CompanyRepository;
use crate::repository::document::DocumentRepository;
use crate::repository::product::ProductRepository;

const MEMORY_PATH: &str = ":memory:";

/// Where the terminal keeps its records.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new(data_dir.join("cajero.db")).max_connections(4)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Default 5; `[database] max_connections` in the terminal config.
    pub max_connections: u32,

    /// How long a write waits for another process holding the lock.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// File database; created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Private database for tests. A single connection, since every
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        // document_items reference documents
        options.foreign_keys(true).busy_timeout(self.busy_timeout)
    }
}

/// Shared handle to the terminal database; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening terminal database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        migrations::run_migrations(&pool).await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }

    pub fn company(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }
}
