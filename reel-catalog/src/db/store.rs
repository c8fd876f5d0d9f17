//! Record store used by the import job
//!
//! Inserts are staged in memory and written in one transaction per
//! `commit()`. Nothing is locked between commits, so the job can sleep
//! between entries while admin requests keep writing to the catalog.

use async_trait::async_trait;
use reel_common::Result;
use sqlx::SqlitePool;

use super::movies::{self, NewMovie};

/// Storage interface the import job depends on
#[async_trait]
pub trait CatalogStore: Send {
    /// Whether an entry (committed or staged) already has this external id
    async fn has_external_id(&mut self, external_id: &str) -> Result<bool>;

    /// Stage an entry for the next commit
    async fn insert(&mut self, movie: NewMovie) -> Result<()>;

    /// Write all staged entries; returns the number of rows written
    async fn commit(&mut self) -> Result<usize>;

    /// Number of staged, uncommitted entries
    fn pending(&self) -> usize;
}

/// SQLite-backed [`CatalogStore`]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
    pending: Vec<NewMovie>,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pending: Vec::new(),
        }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn has_external_id(&mut self, external_id: &str) -> Result<bool> {
        let staged = self
            .pending
            .iter()
            .any(|m| m.external_id.as_deref() == Some(external_id));
        if staged {
            return Ok(true);
        }

        Ok(movies::find_by_external_id(&self.pool, external_id)
            .await?
            .is_some())
    }

    async fn insert(&mut self, movie: NewMovie) -> Result<()> {
        self.pending.push(movie);
        Ok(())
    }

    async fn commit(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for movie in &self.pending {
            if movies::insert_movie(&mut *tx, movie).await?.is_some() {
                written += 1;
            }
        }
        tx.commit().await?;

        let skipped = self.pending.len() - written;
        if skipped > 0 {
            // Another writer inserted the same external id after our lookup
            tracing::warn!(skipped, "Staged entries already present at commit time");
        }
        tracing::debug!(written, "Committed staged catalog entries");

        self.pending.clear();
        Ok(written)
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}
