//! Database access layer for vigil-hub
//!
//! Reports live in a single SQLite table. Tests use an in-memory database;
//! the binary uses `vigil.db` in the data folder.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

mod reports;
pub use reports::{count_open_urgent, get_report, insert_report, list_reports, update_status};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id            TEXT PRIMARY KEY NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    category      TEXT NOT NULL,
    status        TEXT NOT NULL,
    urgency_level INTEGER NOT NULL,
    location      TEXT NOT NULL,
    anonymous     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports (created_at);
CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status);
"#;

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn connect(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database with the schema applied
///
/// Pinned to a single connection that is never recycled: every SQLite
/// `:memory:` connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
