//! Event types for the Reel event system
//!
//! Provides the catalog event definitions and the EventBus used to fan
//! import progress out to SSE clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Catalog event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// Import run accepted and started
    ImportStarted {
        run_id: Uuid,
        limit: u32,
        timestamp: DateTime<Utc>,
    },

    /// An entry was inserted by the running import
    ImportProgress {
        run_id: Uuid,
        inserted: u32,
        limit: u32,
        /// Title of the entry just inserted
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// Import run ended without a job-fatal error
    ImportCompleted {
        run_id: Uuid,
        inserted: u32,
        timestamp: DateTime<Utc>,
    },

    /// Import run ended with a job-fatal error
    ImportFailed {
        run_id: Uuid,
        inserted: u32,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A catalog entry was created, updated or deleted through the admin API
    MovieChanged {
        movie_id: i64,
        change: MovieChange,
        timestamp: DateTime<Utc>,
    },
}

/// Kind of admin change applied to a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieChange {
    Created,
    Updated,
    Deleted,
}

impl CatalogEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ImportStarted { .. } => "ImportStarted",
            CatalogEvent::ImportProgress { .. } => "ImportProgress",
            CatalogEvent::ImportCompleted { .. } => "ImportCompleted",
            CatalogEvent::ImportFailed { .. } => "ImportFailed",
            CatalogEvent::MovieChanged { .. } => "MovieChanged",
        }
    }

    /// Whether the event belongs to the import stream
    pub fn is_import_event(&self) -> bool {
        !matches!(self, CatalogEvent::MovieChanged { .. })
    }
}

/// Broadcast bus for catalog events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow receivers
    /// start missing the oldest ones.
    ///
    /// ```
    /// use reel_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CatalogEvent,
    ) -> Result<usize, broadcast::error::SendError<CatalogEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
