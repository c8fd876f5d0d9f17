//! HTTP API handlers for reel-catalog
//!
//! JSON REST endpoints plus an SSE stream of import events.

pub mod health;
pub mod import;
pub mod movies;
pub mod settings;
pub mod sse;

pub use health::health_routes;
pub use import::import_routes;
pub use movies::movie_routes;
pub use settings::settings_routes;
pub use sse::import_event_stream;
