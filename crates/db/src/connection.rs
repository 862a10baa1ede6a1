//! SQLite pool construction.

use std::str::FromStr;
use std::time::Duration;

use formflow_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// Open a pool for the configured database. Every connection enforces
/// foreign keys, and the journal runs in WAL mode so reporting reads do
/// not block the decision write path.
pub async fn connect(database: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&database.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(database.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(database.timeout_secs.max(1)))
        .connect_with(options)
        .await
}

/// Single-connection pool over a private in-memory database. The one pooled
/// connection stays open and keeps the database alive, which is what the
/// repository tests rely on.
pub async fn connect_in_memory() -> Result<DbPool, sqlx::Error> {
    connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 30,
    })
    .await
}
