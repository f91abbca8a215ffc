//! Worklog Storage
//!
//! `SQLite` persistence for users and work records.
//!
//! # Architecture
//!
//! - **Gateway**: one query surface ([`Gateway`]) with portable `?` markers,
//!   shared by autocommit sessions and transactional connections
//! - **Vertical Slicing**: each entity owns its SQL and row mapping
//!   ([`users`], [`records`])
//! - **Transactional writes**: every write runs in its own transaction and
//!   releases its connection on commit or rollback
//!
//! # Example
//!
//! ```rust,no_run
//! use worklog_storage::{Database, Gateway};
//! use worklog_storage::users::Users;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("sqlite://worklog.db").await?;
//!
//! let mut session = db.session().await?;
//! let count: Option<i64> = session.query_value("SELECT COUNT(*) FROM users", vec![]).await?;
//!
//! let users = Users::new(db.clone());
//! let everyone = users.get_all().await?;
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
mod gateway;

// Vertical slices
pub mod records;
pub mod users;

pub use database::{create_pool, Connection, Database, PoolSettings, Session};
pub use error::{Result, StorageError};
pub use gateway::{prepare, rewrite_placeholders, Gateway, Value, DAY_FORMAT, TIMESTAMP_FORMAT};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Called once at startup (and by [`Database::new`]) to bring the schema up
/// to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
