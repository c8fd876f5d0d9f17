//! Settings database operations
//!
//! Key-value accessors for the `settings` table.

use sqlx::{Pool, Sqlite};
use reel_common::{Error, Result};

const TMDB_API_KEY: &str = "tmdb_api_key";

/// Get TMDB API key from database
///
/// **Returns:** Some(key) if exists, None if not set
pub async fn get_tmdb_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, TMDB_API_KEY).await
}

/// Set TMDB API key in database
pub async fn set_tmdb_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, TMDB_API_KEY, key).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: ToString,
{
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value.to_string())
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(())
}
