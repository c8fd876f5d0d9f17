//! Import status snapshot
//!
//! The running job is the only writer; any number of status requests read.
//! Each update publishes a fresh immutable [`ImportStatus`] behind a short
//! mutex, so readers always get a whole snapshot and never wait on the job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Progress of the current (or last) import run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStatus {
    /// A job is alive
    pub running: bool,
    /// Entries inserted by the current run
    pub inserted: u32,
    /// Job-fatal error of the current run, if any
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportStatus {
    fn started(run_id: Uuid) -> Self {
        Self {
            running: true,
            inserted: 0,
            last_error: None,
            run_id: Some(run_id),
            started_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    /// Run ended without a job-fatal error
    pub fn succeeded(&self) -> bool {
        !self.running && self.last_error.is_none()
    }
}

/// Shared, atomically published import status
///
/// The `running` flag doubles as the liveness slot: [`StatusBoard::try_begin`]
/// checks and sets it in one critical section.
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: Mutex<Arc<ImportStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Arc<ImportStatus>> {
        // Poisoned or not, the slot always holds a whole snapshot
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ImportStatus {
        let current = Arc::clone(&self.slot());
        (*current).clone()
    }

    /// Claim the board for a new run
    ///
    /// Returns `false` without touching the status if a run is alive.
    /// Otherwise resets the status to `{running, inserted: 0, last_error: None}`.
    pub fn try_begin(&self, run_id: Uuid) -> bool {
        let mut slot = self.slot();
        if slot.running {
            return false;
        }
        *slot = Arc::new(ImportStatus::started(run_id));
        true
    }

    /// Publish the inserted count of the running job
    pub fn record_inserted(&self, inserted: u32) {
        let mut slot = self.slot();
        if !slot.running {
            return;
        }
        let mut next = (**slot).clone();
        next.inserted = inserted;
        *slot = Arc::new(next);
    }

    /// Mark the run as ended
    ///
    /// `last_error` is only set if the run has not recorded one yet.
    pub fn finish(&self, error: Option<String>) {
        let mut slot = self.slot();
        let mut next = (**slot).clone();
        next.running = false;
        next.finished_at = Some(Utc::now());
        if next.last_error.is_none() {
            next.last_error = error;
        }
        *slot = Arc::new(next);
    }

    pub fn is_running(&self) -> bool {
        self.slot().running
    }
}
