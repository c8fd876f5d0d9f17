//! reel-catalog library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use reel_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServiceSettings;
use crate::services::{ImportSupervisor, ServiceResources};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Owner of the single import job slot
    pub supervisor: Arc<ImportSupervisor>,
    /// Bootstrap configuration
    pub settings: Arc<ServiceSettings>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State wired to the SQLite catalog and TMDB
    pub fn new(db: SqlitePool, event_bus: EventBus, settings: ServiceSettings) -> Self {
        let settings = Arc::new(settings);
        let resources = Arc::new(ServiceResources::new(db.clone(), Arc::clone(&settings)));
        let supervisor = ImportSupervisor::new(resources, settings.import_defaults().clone())
            .with_event_bus(event_bus.clone());

        Self::with_supervisor(db, event_bus, settings, Arc::new(supervisor))
    }

    /// State with a caller-provided supervisor
    pub fn with_supervisor(
        db: SqlitePool,
        event_bus: EventBus,
        settings: Arc<ServiceSettings>,
        supervisor: Arc<ImportSupervisor>,
    ) -> Self {
        Self {
            db,
            event_bus,
            supervisor,
            settings,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::movie_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
