//! Database access for plm-mr
//!
//! The song catalog lives in a single SQLite file under the library root.

pub mod songs;

use songs::CatalogStoreError;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the file and the `songs` table when missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool, CatalogStoreError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the catalog tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<(), CatalogStoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            artist TEXT,
            album TEXT,
            year INTEGER,
            duration REAL,
            file_path TEXT NOT NULL,
            bitrate INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (songs)");

    Ok(())
}
