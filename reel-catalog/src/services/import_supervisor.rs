//! Import job supervision
//!
//! Guarantees at most one import job is alive at a time and exposes its
//! status. The job runs as a detached tokio task owned by the supervisor,
//! never by the request that triggered it.

use async_trait::async_trait;
use chrono::Utc;
use reel_common::config::ImportDefaults;
use reel_common::events::{CatalogEvent, EventBus};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ServiceSettings;
use crate::db::{CatalogStore, SqliteCatalogStore};
use crate::models::{ImportParameters, ImportStatus, StatusBoard};
use crate::services::import_job::{ImportError, ImportJob};
use crate::services::tmdb_client::CatalogSource;

/// Collaborators an import run needs, resolved when the run starts
#[async_trait]
pub trait JobResources: Send + Sync {
    /// External catalog client, built with the credential configured right now
    async fn catalog_source(&self) -> Result<Arc<dyn CatalogSource>, ImportError>;

    /// Fresh record store for one run
    fn record_store(&self) -> Box<dyn CatalogStore>;
}

/// Production resources: SQLite catalog plus TMDB
pub struct ServiceResources {
    db: SqlitePool,
    settings: Arc<ServiceSettings>,
}

impl ServiceResources {
    pub fn new(db: SqlitePool, settings: Arc<ServiceSettings>) -> Self {
        Self { db, settings }
    }
}

#[async_trait]
impl JobResources for ServiceResources {
    async fn catalog_source(&self) -> Result<Arc<dyn CatalogSource>, ImportError> {
        let client = crate::config::build_tmdb_client(&self.db, &self.settings).await?;
        let source: Arc<dyn CatalogSource> = Arc::new(client);
        Ok(source)
    }

    fn record_store(&self) -> Box<dyn CatalogStore> {
        Box::new(SqliteCatalogStore::new(self.db.clone()))
    }
}

/// Owner of the single import job slot
pub struct ImportSupervisor {
    board: Arc<StatusBoard>,
    resources: Arc<dyn JobResources>,
    defaults: ImportDefaults,
    event_bus: Option<EventBus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ImportSupervisor {
    pub fn new(resources: Arc<dyn JobResources>, defaults: ImportDefaults) -> Self {
        Self {
            board: Arc::new(StatusBoard::new()),
            resources,
            defaults,
            event_bus: None,
            task: Mutex::new(None),
        }
    }

    /// Broadcast import lifecycle events on this bus
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Start an import of up to `limit` entries with the service defaults
    ///
    /// Returns `false` (and changes nothing) if a job is already alive.
    pub fn start(&self, limit: u32) -> bool {
        self.start_with(ImportParameters::with_defaults(limit, &self.defaults))
    }

    /// Start an import with explicit parameters
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with(&self, params: ImportParameters) -> bool {
        let run_id = Uuid::new_v4();

        // Held until the new handle is stored so handles land in start order
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());

        // Check-and-set of the liveness flag happens inside the board lock
        if !self.board.try_begin(run_id) {
            tracing::info!("Import already running, start request ignored");
            return false;
        }

        tracing::info!(
            %run_id,
            limit = params.limit,
            start_page = params.start_page,
            "Import job starting"
        );

        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(CatalogEvent::ImportStarted {
                run_id,
                limit: params.limit,
                timestamp: Utc::now(),
            });
        }

        let handle = tokio::spawn(run_detached(
            run_id,
            params,
            Arc::clone(&self.resources),
            Arc::clone(&self.board),
            self.event_bus.clone(),
        ));

        *task = Some(handle);

        true
    }

    /// Wait until the most recently started job task has ended
    ///
    /// Returns at once when no job was started since the last wait. Once it
    /// returns, the final status and terminal event are both published.
    pub async fn wait(&self) {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Import job task did not complete");
            }
        }
    }

    /// Current status snapshot; never waits on the job
    pub fn status(&self) -> ImportStatus {
        self.board.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.board.is_running()
    }
}

/// Marks the board finished if the job task unwinds before doing so itself
struct FinishOnDrop {
    board: Option<Arc<StatusBoard>>,
}

impl FinishOnDrop {
    fn disarm(mut self) {
        self.board = None;
    }
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        if let Some(board) = self.board.take() {
            tracing::error!("Import job task ended abnormally");
            board.finish(Some("import job aborted unexpectedly".to_string()));
        }
    }
}

async fn run_detached(
    run_id: Uuid,
    params: ImportParameters,
    resources: Arc<dyn JobResources>,
    board: Arc<StatusBoard>,
    event_bus: Option<EventBus>,
) {
    let guard = FinishOnDrop {
        board: Some(Arc::clone(&board)),
    };

    let outcome = match resources.catalog_source().await {
        Ok(source) => {
            let mut job = ImportJob::new(source, resources.record_store(), params);
            if let Some(bus) = &event_bus {
                job = job.with_event_bus(bus.clone());
            }
            let outcome = job.run(run_id, &board).await;
            (outcome.inserted, outcome.error)
        }
        Err(e) => (0, Some(e)),
    };

    guard.disarm();

    match outcome {
        (inserted, None) => {
            tracing::info!(%run_id, inserted, "Import job completed");
            board.finish(None);
            if let Some(bus) = &event_bus {
                bus.emit_lossy(CatalogEvent::ImportCompleted {
                    run_id,
                    inserted,
                    timestamp: Utc::now(),
                });
            }
        }
        (inserted, Some(e)) => {
            let message = e.to_string();
            tracing::error!(%run_id, inserted, error = %message, "Import job failed");
            board.finish(Some(message.clone()));
            if let Some(bus) = &event_bus {
                bus.emit_lossy(CatalogEvent::ImportFailed {
                    run_id,
                    inserted,
                    error: message,
                    timestamp: Utc::now(),
                });
            }
        }
    }
}
