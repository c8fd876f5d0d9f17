//! TMDB bulk import job
//!
//! Walks the discover pages sorted by revenue, skips movies already in the
//! catalog, enriches each new movie with its credits and stages it for
//! insertion. Staged movies are committed every [`COMMIT_BATCH`] inserts and
//! once more when the run stops, whatever the reason.
//!
//! Dedup by external id makes a run safe to repeat: a second run only adds
//! what the first one did not get to.

use chrono::Utc;
use reel_common::events::{CatalogEvent, EventBus};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::movies::NewMovie;
use crate::db::CatalogStore;
use crate::models::{ImportParameters, StatusBoard, DISCOVER_PAGE_SIZE};
use crate::services::tmdb_client::{
    poster_url_from_path, CatalogSource, DiscoverMovie, Enrichment, TmdbError,
};

/// Inserts staged between two commits, one discover page worth
pub const COMMIT_BATCH: u32 = DISCOVER_PAGE_SIZE;

/// Job-fatal import errors
///
/// The display text is what status readers see as `last_error`.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("TMDB_API_KEY not configured")]
    MissingApiKey,

    #[error("TMDB error page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: TmdbError,
    },

    #[error("database error: {0}")]
    Database(#[from] reel_common::Error),
}

/// Result of one run
#[derive(Debug)]
pub struct ImportOutcome {
    pub inserted: u32,
    pub pages_fetched: u32,
    pub error: Option<ImportError>,
}

/// Single import run
pub struct ImportJob {
    source: Arc<dyn CatalogSource>,
    store: Box<dyn CatalogStore>,
    params: ImportParameters,
    event_bus: Option<EventBus>,
}

/// Counters of the run in progress
#[derive(Debug, Default)]
struct RunProgress {
    inserted: u32,
    pages_fetched: u32,
}

impl ImportJob {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Box<dyn CatalogStore>,
        params: ImportParameters,
    ) -> Self {
        Self {
            source,
            store,
            params,
            event_bus: None,
        }
    }

    /// Broadcast per-entry progress on this bus
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn params(&self) -> &ImportParameters {
        &self.params
    }

    /// Execute the run, publishing inserted counts on `board`
    ///
    /// Does not mark the board finished; the supervisor does that with the
    /// returned outcome.
    pub async fn run(mut self, run_id: Uuid, board: &StatusBoard) -> ImportOutcome {
        let mut progress = RunProgress::default();

        let result = self.import_pages(run_id, board, &mut progress).await;

        // Flush whatever is still staged, on success and on early stop alike
        let flushed = self.store.commit().await;

        let error = match (result, flushed) {
            (Err(e), Err(flush_error)) => {
                tracing::error!(
                    %run_id,
                    error = %flush_error,
                    "Final commit failed after import error"
                );
                Some(e)
            }
            (Err(e), Ok(_)) => Some(e),
            (Ok(()), Err(flush_error)) => Some(ImportError::Database(flush_error)),
            (Ok(()), Ok(_)) => None,
        };

        ImportOutcome {
            inserted: progress.inserted,
            pages_fetched: progress.pages_fetched,
            error,
        }
    }

    async fn import_pages(
        &mut self,
        run_id: Uuid,
        board: &StatusBoard,
        progress: &mut RunProgress,
    ) -> Result<(), ImportError> {
        if !self.source.is_configured() {
            return Err(ImportError::MissingApiKey);
        }

        let limit = self.params.limit;
        let mut page = self.params.start_page.max(1);

        while progress.inserted < limit {
            if progress.pages_fetched >= self.params.max_pages {
                tracing::info!(
                    %run_id,
                    pages_fetched = progress.pages_fetched,
                    "Page budget exhausted, stopping import"
                );
                break;
            }

            let results = self
                .source
                .discover_page(page)
                .await
                .map_err(|source| ImportError::PageFetch { page, source })?;
            progress.pages_fetched += 1;

            if results.is_empty() {
                tracing::info!(%run_id, page, "No more discover results");
                break;
            }

            for item in results {
                if !self.import_entry(run_id, &item, progress).await? {
                    continue;
                }
                board.record_inserted(progress.inserted);

                if progress.inserted % COMMIT_BATCH == 0 {
                    self.store.commit().await?;
                }

                if progress.inserted >= limit {
                    break;
                }

                // Suspends this task only; no store or status lock is held here
                tokio::time::sleep(self.params.page_delay()).await;
            }

            page = match page.checked_add(1) {
                Some(next) => next,
                None => {
                    tracing::info!(%run_id, page, "Last addressable page reached");
                    break;
                }
            };
        }

        tracing::info!(
            %run_id,
            inserted = progress.inserted,
            pages_fetched = progress.pages_fetched,
            "Import pages processed"
        );
        Ok(())
    }

    /// Stage one discover result; returns `false` if it was skipped
    async fn import_entry(
        &mut self,
        run_id: Uuid,
        item: &DiscoverMovie,
        progress: &mut RunProgress,
    ) -> Result<bool, ImportError> {
        let external_id = item.external_id();

        if self.store.has_external_id(&external_id).await? {
            tracing::debug!(%external_id, "Already in catalog, skipping");
            return Ok(false);
        }

        let Some(title) = item.display_title() else {
            tracing::warn!(%external_id, "Discover result without title, skipping");
            return Ok(false);
        };

        let enrichment = match self.source.fetch_credits(&external_id).await {
            Ok(credits) => Enrichment::from_credits(&credits),
            Err(e) => {
                tracing::warn!(%external_id, error = %e, "Credits lookup failed, inserting without them");
                Enrichment::default()
            }
        };

        let movie = NewMovie {
            title: title.clone(),
            year: item.year(),
            box_office: None,
            director: enrichment.director,
            producer: enrichment.producer,
            cast: enrichment.cast,
            poster_url: Some(poster_url_from_path(item.poster_path.as_deref())),
            external_id: Some(external_id),
        };
        self.store.insert(movie).await?;
        progress.inserted += 1;

        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(CatalogEvent::ImportProgress {
                run_id,
                inserted: progress.inserted,
                limit: self.params.limit,
                title,
                timestamp: Utc::now(),
            });
        }

        Ok(true)
    }
}
