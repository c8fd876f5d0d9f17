//! Movie database operations
//!
//! Catalog entries are created by the admin API or by the TMDB import job.
//! `external_id` is the TMDB id and doubles as the import dedup key.

use reel_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

/// Poster used when an entry has no poster of its own
pub const DEFAULT_POSTER_URL: &str = "/static/images/default_poster.png";

/// Movie record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: Option<String>,
    pub box_office: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    /// Comma-joined cast names
    pub cast: Option<String>,
    pub poster_url: String,
    /// TMDB id, present for imported entries
    pub external_id: Option<String>,
}

/// Movie not yet assigned an id by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: Option<String>,
    pub box_office: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub cast: Option<String>,
    /// Falls back to [`DEFAULT_POSTER_URL`] when absent
    pub poster_url: Option<String>,
    pub external_id: Option<String>,
}

/// Admin edit of an existing movie
///
/// `external_id` is intentionally absent: it is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
    pub title: String,
    pub year: Option<String>,
    pub box_office: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub cast: Option<String>,
    /// Keeps the current poster when `None`
    pub poster_url: Option<String>,
}

/// Treat blank strings as missing values
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        year: row.try_get("year")?,
        box_office: row.try_get("box_office")?,
        director: row.try_get("director")?,
        producer: row.try_get("producer")?,
        cast: row.try_get("cast_names")?,
        poster_url: row.try_get("poster_url")?,
        external_id: row.try_get("external_id")?,
    })
}

const MOVIE_COLUMNS: &str =
    "id, title, year, box_office, director, producer, cast_names, poster_url, external_id";

/// Insert a movie
///
/// Generic over the executor so batches can run inside one transaction.
/// Returns `None` when another entry already holds the same `external_id`.
pub async fn insert_movie<'e, E>(executor: E, movie: &NewMovie) -> Result<Option<i64>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let title = require_title(&movie.title)?;
    let poster_url = non_empty(movie.poster_url.clone())
        .unwrap_or_else(|| DEFAULT_POSTER_URL.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO movies (
            title, year, box_office, director, producer, cast_names,
            poster_url, external_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(external_id) WHERE external_id IS NOT NULL DO NOTHING
        "#,
    )
    .bind(title)
    .bind(non_empty(movie.year.clone()))
    .bind(non_empty(movie.box_office.clone()))
    .bind(non_empty(movie.director.clone()))
    .bind(non_empty(movie.producer.clone()))
    .bind(non_empty(movie.cast.clone()))
    .bind(poster_url)
    .bind(non_empty(movie.external_id.clone()))
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(result.last_insert_rowid()))
}

/// Load movie by id
pub async fn load_movie(pool: &SqlitePool, id: i64) -> Result<Option<Movie>> {
    let row = sqlx::query(&format!("SELECT {} FROM movies WHERE id = ?", MOVIE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(movie_from_row).transpose()
}

/// Load movie by TMDB id
pub async fn find_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Option<Movie>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM movies WHERE external_id = ?",
        MOVIE_COLUMNS
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(movie_from_row).transpose()
}

/// Search filter shared by [`count_movies`] and [`search_movies`]
///
/// Matches title, director or cast, case-insensitively. Empty query matches all.
const SEARCH_FILTER: &str = "(?1 = '' \
    OR title LIKE ?2 ESCAPE '\\' \
    OR director LIKE ?2 ESCAPE '\\' \
    OR cast_names LIKE ?2 ESCAPE '\\')";

/// Substring pattern with `%` and `_` in the query matched literally
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Count movies matching a search query
pub async fn count_movies(pool: &SqlitePool, query: &str) -> Result<i64> {
    let query = query.trim();
    let (count,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM movies WHERE {}",
        SEARCH_FILTER
    ))
    .bind(query)
    .bind(like_pattern(query))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Fetch one page of movies matching a search query, oldest first
pub async fn search_movies(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Movie>> {
    let query = query.trim();
    let rows = sqlx::query(&format!(
        "SELECT {} FROM movies WHERE {} ORDER BY id ASC LIMIT ?3 OFFSET ?4",
        MOVIE_COLUMNS, SEARCH_FILTER
    ))
    .bind(query)
    .bind(like_pattern(query))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(movie_from_row).collect()
}

/// Apply an admin edit
///
/// Returns `false` when no movie has this id.
pub async fn update_movie(pool: &SqlitePool, id: i64, update: &MovieUpdate) -> Result<bool> {
    let title = require_title(&update.title)?;

    let result = sqlx::query(
        r#"
        UPDATE movies SET
            title = ?,
            year = ?,
            box_office = ?,
            director = ?,
            producer = ?,
            cast_names = ?,
            poster_url = COALESCE(?, poster_url),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(non_empty(update.year.clone()))
    .bind(non_empty(update.box_office.clone()))
    .bind(non_empty(update.director.clone()))
    .bind(non_empty(update.producer.clone()))
    .bind(non_empty(update.cast.clone()))
    .bind(non_empty(update.poster_url.clone()))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a movie
///
/// Returns `false` when no movie has this id.
pub async fn delete_movie(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Make sure an empty catalog has at least one entry to show
pub async fn seed_default_movie(pool: &SqlitePool) -> Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Ok(());
    }

    let sample = NewMovie {
        title: "Inception".to_string(),
        year: Some("2010".to_string()),
        box_office: Some("$829,895,144".to_string()),
        director: Some("Christopher Nolan".to_string()),
        producer: Some("Emma Thomas".to_string()),
        cast: Some("Leonardo DiCaprio, Joseph Gordon-Levitt, Elliot Page".to_string()),
        poster_url: None,
        external_id: None,
    };
    insert_movie(pool, &sample).await?;

    tracing::info!("Seeded empty catalog with sample movie");
    Ok(())
}
