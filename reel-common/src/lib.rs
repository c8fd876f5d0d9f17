//! # Reel Common Library
//!
//! Shared code for the Reel catalog service including:
//! - Error and result types
//! - Configuration loading (root folder, TOML bootstrap file)
//! - Catalog event types and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
