//! Database access for owc-collector
//!
//! SQLite file `owc.db` in the root folder. Jobs are stored as one row per
//! job key with the record list kept as a JSON document.

pub mod jobs;

use owc_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
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

/// Create collector tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_jobs (
            user_defined_id TEXT PRIMARY KEY,
            request_datetime TEXT NOT NULL,
            city_info TEXT NOT NULL DEFAULT '{"cities_info":[]}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (weather_jobs)");

    Ok(())
}
