//! Bulk seeding of the catalog from a CSV file
//!
//! Expected header: `title,year,box_office,director,producer,cast,poster_url`.
//! Only `title` is required; missing or blank columns are stored as NULL and a
//! blank poster falls back to the default poster. Rows carry no external id,
//! so seeding the same file twice adds the rows twice.

use reel_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::io::Read;
use std::path::Path;

use super::movies::{self, NewMovie};

/// One CSV row
#[derive(Debug, Deserialize)]
struct CsvMovie {
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    box_office: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    producer: Option<String>,
    #[serde(default)]
    cast: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
}

impl From<CsvMovie> for NewMovie {
    fn from(row: CsvMovie) -> Self {
        NewMovie {
            title: row.title,
            year: row.year,
            box_office: row.box_office,
            director: row.director,
            producer: row.producer,
            cast: row.cast,
            poster_url: row.poster_url,
            external_id: None,
        }
    }
}

/// Outcome of a seeding run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    /// Rows without a title
    pub skipped: usize,
}

/// Seed the catalog from the CSV file at `path`
pub async fn seed_from_csv_file(pool: &SqlitePool, path: &Path) -> Result<SeedReport> {
    let file = std::fs::File::open(path)?;
    tracing::info!("Seeding catalog from {}", path.display());
    seed_from_csv(pool, file).await
}

/// Seed the catalog from CSV data
///
/// The whole input is parsed before anything is written; a malformed row
/// aborts the seed with nothing inserted. All rows go in one transaction.
pub async fn seed_from_csv<R: Read>(pool: &SqlitePool, input: R) -> Result<SeedReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<CsvMovie>().enumerate() {
        // Line 1 is the header
        let row = record
            .map_err(|e| Error::InvalidInput(format!("CSV row {}: {}", index + 2, e)))?;
        rows.push(row);
    }

    let mut report = SeedReport::default();
    let mut tx = pool.begin().await?;
    for row in rows {
        if row.title.trim().is_empty() {
            tracing::warn!("CSV row without title, skipping");
            report.skipped += 1;
            continue;
        }
        if movies::insert_movie(&mut *tx, &NewMovie::from(row))
            .await?
            .is_some()
        {
            report.inserted += 1;
        }
    }
    tx.commit().await?;

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Catalog seeded from CSV"
    );
    Ok(report)
}
