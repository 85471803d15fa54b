use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqliteConnection;

use modista_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens the application pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// Opens a SQLite pool with the session settings every repository relies on:
/// foreign keys enforced, WAL journaling so readers do not block the writer,
/// and a busy timeout so short write contention waits instead of erroring.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| Box::pin(configure_session(conn)))
        .connect(database_url)
        .await
}

async fn configure_session(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let pragmas =
        ["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"];
    for pragma in pragmas {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }
    Ok(())
}
