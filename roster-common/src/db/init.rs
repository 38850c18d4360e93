//! Database initialization
//!
//! Opens the SQLite store, applies connection pragmas, and creates the
//! department and user tables if they are missing. Table creation is
//! idempotent; there is no versioned migration.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pooled connection
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go through the connect options so every pooled connection
    // gets them, not just the first one.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the schema applied
///
/// The pool holds exactly one connection; a second connection would see a
/// different, empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Verify the store answers queries
pub async fn check_connectivity(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_departments_table(pool).await?;
    create_users_table(pool).await?;
    Ok(())
}

/// `status = '1'` marks an active department
async fn create_departments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS m_departments (
            id INTEGER PRIMARY KEY,
            dept_short TEXT NOT NULL UNIQUE COLLATE NOCASE,
            dept_name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT '1'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// `status` is the edited flag; imports reset it to '0'
async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS m_users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            dept INTEGER NOT NULL REFERENCES m_departments(id),
            year TEXT NOT NULL,
            degree TEXT NOT NULL DEFAULT 'UG' CHECK (degree IN ('UG', 'PG', 'MBA', 'PHD')),
            status TEXT NOT NULL DEFAULT '0'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_m_users_dept ON m_users(dept)")
        .execute(pool)
        .await?;

    Ok(())
}
