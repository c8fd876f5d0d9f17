//! Database access for reel-catalog
//!
//! SQLite database holding the movie catalog and runtime settings.

pub mod movies;
pub mod seed;
pub mod settings;
pub mod store;

use reel_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

pub use store::{CatalogStore, SqliteCatalogStore};

/// Initialize database connection pool
///
/// Opens (or creates) the database file and makes sure all tables exist.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;
    movies::seed_default_movie(&pool).await?;

    Ok(pool)
}

/// Create the catalog tables if they don't exist
///
/// `external_id` carries a partial unique index: manual entries leave it
/// NULL, imported entries can never share one.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            year TEXT,
            box_office TEXT,
            director TEXT,
            producer TEXT,
            cast_names TEXT,
            poster_url TEXT NOT NULL,
            external_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_movies_external_id
            ON movies(external_id)
            WHERE external_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, movies)");

    Ok(())
}
