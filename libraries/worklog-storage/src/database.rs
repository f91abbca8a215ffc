//! Pooled database handle, autocommit sessions and transactional connections

use crate::error::Result;
use crate::gateway::{execute_on, fetch_on, Gateway, Value};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Transaction;
use std::str::FromStr;
use std::time::Duration;

/// Connection pool tuning
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up
    pub acquire_timeout: Duration,
    /// Prepared statements cached per physical connection
    pub statement_cache_capacity: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            statement_cache_capacity: 100,
        }
    }
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://worklog.db`)
/// * `settings` - pool size, acquire timeout and statement cache size
///
/// # Errors
///
/// Returns an error if the URL is invalid or the first connection fails
pub async fn create_pool(database_url: &str, settings: &PoolSettings) -> Result<SqlitePool> {
    tracing::info!(url = database_url, "Creating database pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true)
        .statement_cache_capacity(settings.statement_cache_capacity);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await?;

    tracing::debug!(
        max_connections = settings.max_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Shared handle to the work log database
///
/// Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) and migrate the database with default settings
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_settings(database_url, &PoolSettings::default()).await
    }

    /// Open (creating if needed) and migrate the database
    pub async fn with_settings(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = create_pool(database_url, settings).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's business
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Borrow a pooled connection in autocommit mode
    pub async fn session(&self) -> Result<Session> {
        let conn = self.pool.acquire().await?;
        Ok(Session { conn })
    }

    /// Borrow a pooled connection with a write transaction already open.
    ///
    /// The write lock is taken at `BEGIN IMMEDIATE`, so a check-then-write
    /// never has to upgrade a read snapshot and competing writers wait out
    /// the busy timeout instead of failing with `SQLITE_BUSY`.
    ///
    /// Fails if no connection frees up within the pool's acquire timeout.
    pub async fn get_connection(&self) -> Result<Connection> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        tracing::trace!("Transaction started");
        Ok(Connection { tx })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// A pooled connection where every statement commits on its own
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl Gateway for Session {
    async fn fetch_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<SqliteRow>> {
        fetch_on(&mut self.conn, sql, params).await
    }

    async fn execute_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        execute_on(&mut self.conn, sql, params).await
    }
}

/// A pooled connection inside an open transaction.
///
/// `commit` and `rollback` consume the connection and hand it back to the
/// pool, so it cannot be used after either has been called. A connection
/// dropped without either is rolled back.
pub struct Connection {
    tx: Transaction<'static, Sqlite>,
}

impl Connection {
    /// Commit and release
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::trace!("Transaction committed");
        Ok(())
    }

    /// Roll back and release
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        tracing::trace!("Transaction rolled back");
        Ok(())
    }

    /// Commit when `outcome` succeeded, roll back when it failed.
    ///
    /// A failed rollback is logged and the original error is returned.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl Gateway for Connection {
    async fn fetch_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<SqliteRow>> {
        fetch_on(&mut self.tx, sql, params).await
    }

    async fn execute_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        execute_on(&mut self.tx, sql, params).await
    }
}
