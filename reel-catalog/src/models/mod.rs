//! Data models for reel-catalog
//!
//! - Import run parameters
//! - Import status snapshot and the board it is published on

pub mod import_status;
pub mod parameters;

pub use import_status::{ImportStatus, StatusBoard};
pub use parameters::{ImportParameters, DISCOVER_PAGE_SIZE};
