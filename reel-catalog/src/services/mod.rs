//! Business logic services for reel-catalog

pub mod import_job;
pub mod import_supervisor;
pub mod tmdb_client;

pub use import_job::{ImportError, ImportJob, ImportOutcome};
pub use import_supervisor::{ImportSupervisor, JobResources, ServiceResources};
pub use tmdb_client::{CatalogSource, TmdbClient, TmdbConfig, TmdbError};
